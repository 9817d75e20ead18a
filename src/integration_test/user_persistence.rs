use super::test_util::prepare_db_and_test;
use crate::domain::user::driven_ports::{DetectUser, UserReader, UserWriter};
use crate::domain::user::CreateUser;
use crate::persistence::db_user_driven_ports::{DbDetectUser, DbReadUsers, DbWriteUsers};
use crate::persistence::ExternalConnectivity;
use speculoos::prelude::*;

fn jane() -> CreateUser {
    CreateUser {
        email: "jane@example.com".to_owned(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
    }
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn can_create_and_read_user() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let mut ext_cxn = ExternalConnectivity::new(db);

            let create_result = DbWriteUsers.create_user(&jane(), &mut ext_cxn).await;
            let Ok(Some(new_id)) = create_result else {
                panic!("User should have been created, got {create_result:#?}");
            };

            let read_result = DbReadUsers
                .user_by_email("jane@example.com", &mut ext_cxn)
                .await;
            assert_that!(read_result).is_ok().is_some().matches(|user| {
                user.id == new_id && user.password_hash == jane().password_hash
            });
        })
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn duplicate_email_is_not_inserted() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let mut ext_cxn = ExternalConnectivity::new(db);

            let first = DbWriteUsers.create_user(&jane(), &mut ext_cxn).await;
            assert_that!(first).is_ok().is_some();

            let second = DbWriteUsers.create_user(&jane(), &mut ext_cxn).await;
            assert_that!(second).is_ok().is_none();
        })
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn detects_users_by_id_and_email() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let mut ext_cxn = ExternalConnectivity::new(db);
            let new_id = DbWriteUsers
                .create_user(&jane(), &mut ext_cxn)
                .await
                .expect("insert should succeed")
                .expect("email should be free");

            assert_that!(DbDetectUser.user_exists(new_id, &mut ext_cxn).await).is_ok_containing(true);
            assert_that!(DbDetectUser.user_exists(new_id + 1, &mut ext_cxn).await)
                .is_ok_containing(false);
            assert_that!(
                DbDetectUser
                    .user_with_email_exists("jane@example.com", &mut ext_cxn)
                    .await
            )
            .is_ok_containing(true);
            assert_that!(
                DbDetectUser
                    .user_with_email_exists("nobody@example.com", &mut ext_cxn)
                    .await
            )
            .is_ok_containing(false);
        })
    });
}
