use super::test_util::prepare_db_and_test;
use crate::domain::todo::driven_ports::{TodoReader, TodoWriter};
use crate::domain::todo::TodoContent;
use crate::domain::user::driven_ports::UserWriter;
use crate::domain::user::CreateUser;
use crate::persistence::db_todo_driven_ports::{DbTodoReader, DbTodoWriter};
use crate::persistence::db_user_driven_ports::DbWriteUsers;
use crate::persistence::ExternalConnectivity;
use speculoos::prelude::*;

async fn insert_user(email: &str, ext_cxn: &mut ExternalConnectivity) -> i32 {
    DbWriteUsers
        .create_user(
            &CreateUser {
                email: email.to_owned(),
                password_hash: "hash".to_owned(),
            },
            ext_cxn,
        )
        .await
        .expect("insert should succeed")
        .expect("email should be free")
}

fn content(title: &str) -> TodoContent {
    TodoContent {
        title: title.to_owned(),
        description: None,
    }
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn lists_newest_first_and_filters_completed() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let mut ext_cxn = ExternalConnectivity::new(db);
            let owner = insert_user("jane@example.com", &mut ext_cxn).await;

            let milk = DbTodoWriter
                .create_todo_for_user(owner, &content("Buy milk"), &mut ext_cxn)
                .await
                .expect("insert should succeed");
            let clean = DbTodoWriter
                .create_todo_for_user(owner, &content("Clean"), &mut ext_cxn)
                .await
                .expect("insert should succeed");
            assert!(!milk.completed);
            assert_eq!(milk.created_at, milk.updated_at);

            let changed = DbTodoWriter
                .set_completed(owner, milk.id, true, &mut ext_cxn)
                .await;
            assert_that!(changed).is_ok_containing(true);

            let everything = DbTodoReader
                .todos_for_user(owner, true, &mut ext_cxn)
                .await
                .expect("listing should succeed");
            let listed_ids: Vec<i32> = everything.iter().map(|todo| todo.id).collect();
            assert_eq!(vec![clean.id, milk.id], listed_ids);

            let pending = DbTodoReader
                .todos_for_user(owner, false, &mut ext_cxn)
                .await
                .expect("listing should succeed");
            assert!(matches!(pending.as_slice(), [todo] if todo.id == clean.id));
        })
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn other_users_cannot_touch_a_todo() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let mut ext_cxn = ExternalConnectivity::new(db);
            let owner = insert_user("jane@example.com", &mut ext_cxn).await;
            let intruder = insert_user("mallory@example.com", &mut ext_cxn).await;
            let todo = DbTodoWriter
                .create_todo_for_user(owner, &content("Private"), &mut ext_cxn)
                .await
                .expect("insert should succeed");

            assert_that!(DbTodoReader.user_todo_by_id(intruder, todo.id, &mut ext_cxn).await)
                .is_ok()
                .is_none();
            assert_that!(
                DbTodoWriter
                    .update_todo(intruder, todo.id, &content("Mine now"), &mut ext_cxn)
                    .await
            )
            .is_ok()
            .is_none();
            assert_that!(
                DbTodoWriter
                    .set_completed(intruder, todo.id, true, &mut ext_cxn)
                    .await
            )
            .is_ok_containing(false);
            assert_that!(DbTodoWriter.toggle_completed(intruder, todo.id, &mut ext_cxn).await)
                .is_ok()
                .is_none();
            assert_that!(DbTodoWriter.delete_todo(intruder, todo.id, &mut ext_cxn).await)
                .is_ok_containing(false);

            let untouched = DbTodoReader
                .user_todo_by_id(owner, todo.id, &mut ext_cxn)
                .await
                .expect("read should succeed");
            assert_that!(untouched).is_some().is_equal_to(&todo);
        })
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn update_toggle_and_delete() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let mut ext_cxn = ExternalConnectivity::new(db);
            let owner = insert_user("jane@example.com", &mut ext_cxn).await;
            let todo = DbTodoWriter
                .create_todo_for_user(owner, &content("Draft"), &mut ext_cxn)
                .await
                .expect("insert should succeed");

            let updated = DbTodoWriter
                .update_todo(
                    owner,
                    todo.id,
                    &TodoContent {
                        title: "Final".to_owned(),
                        description: Some("ship it".to_owned()),
                    },
                    &mut ext_cxn,
                )
                .await
                .expect("update should succeed")
                .expect("todo should exist");
            assert_eq!("Final", updated.title);
            assert_eq!(Some("ship it".to_owned()), updated.description);
            assert!(updated.updated_at >= todo.updated_at);

            assert_that!(DbTodoWriter.toggle_completed(owner, todo.id, &mut ext_cxn).await)
                .is_ok_containing(Some(true));
            assert_that!(DbTodoWriter.toggle_completed(owner, todo.id, &mut ext_cxn).await)
                .is_ok_containing(Some(false));

            assert_that!(DbTodoWriter.delete_todo(owner, todo.id, &mut ext_cxn).await)
                .is_ok_containing(true);
            assert_that!(DbTodoReader.user_todo_by_id(owner, todo.id, &mut ext_cxn).await)
                .is_ok()
                .is_none();
        })
    });
}
