use super::test_util::prepare_db_and_test;
use crate::api::auth::SessionKeys;
use crate::api::test_util::{deserialize_body, json_request};
use crate::{api, persistence, SharedData};
use axum::http::{Method, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

fn router_for(db: PgPool) -> Router {
    api::build_router(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db),
        session_keys: SessionKeys::new("integration-secret", Duration::minutes(30)),
    }))
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(json_request(method, uri, token, body))
        .await
        .expect("router should respond");
    let status = response.status();

    (status, deserialize_body(response.into_body()).await)
}

async fn register_and_login(router: &Router, email: &str) -> String {
    let registration = format!(
        r#"{{"email": "{email}", "password": "Secret1!", "password_confirm": "Secret1!"}}"#
    );
    let (status, _) = send(router, Method::POST, "/auth/register", None, &registration).await;
    assert_eq!(StatusCode::CREATED, status);

    let login = format!(r#"{{"email": "{email}", "password": "Secret1!"}}"#);
    let (status, body) = send(router, Method::POST, "/auth/login", None, &login).await;
    assert_eq!(StatusCode::OK, status);

    body["token"]
        .as_str()
        .expect("login should return a token")
        .to_owned()
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn registration_is_case_insensitive_and_login_is_uniform() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let router = router_for(db);
            register_and_login(&router, "a@x.com").await;

            let (status, body) = send(
                &router,
                Method::POST,
                "/auth/register",
                None,
                r#"{"email": "A@X.com", "password": "Secret1!", "password_confirm": "Secret1!"}"#,
            )
            .await;
            assert_eq!(StatusCode::CONFLICT, status);
            assert_eq!("An account with this email already exists", body["error_description"]);

            let (wrong_password_status, wrong_password) = send(
                &router,
                Method::POST,
                "/auth/login",
                None,
                r#"{"email": "a@x.com", "password": "wrong"}"#,
            )
            .await;
            let (unknown_status, unknown_user) = send(
                &router,
                Method::POST,
                "/auth/login",
                None,
                r#"{"email": "nouser@x.com", "password": "x"}"#,
            )
            .await;
            assert_eq!(StatusCode::UNAUTHORIZED, wrong_password_status);
            assert_eq!(wrong_password_status, unknown_status);
            assert_eq!(wrong_password, unknown_user);
        })
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn todo_lifecycle_over_http() {
    prepare_db_and_test(|db| {
        Box::pin(async move {
            let router = router_for(db);
            let jane = register_and_login(&router, "jane@example.com").await;
            let mallory = register_and_login(&router, "mallory@example.com").await;

            let (status, created) = send(
                &router,
                Method::POST,
                "/todos",
                Some(&jane),
                r#"{"title": "  Buy milk ", "description": "   "}"#,
            )
            .await;
            assert_eq!(StatusCode::CREATED, status);
            assert_eq!("Buy milk", created["todo"]["title"]);
            assert!(created["todo"]["description"].is_null());
            let todo_uri = format!("/todos/{}", created["todo"]["id"]);

            let (status, _) = send(&router, Method::GET, &todo_uri, Some(&mallory), "").await;
            assert_eq!(StatusCode::NOT_FOUND, status);

            let completion_uri = format!("{todo_uri}/completion");
            let (status, completion) = send(
                &router,
                Method::PUT,
                &completion_uri,
                Some(&jane),
                r#"{"completed": true}"#,
            )
            .await;
            assert_eq!(StatusCode::OK, status);
            assert_eq!(true, completion["changed"]);

            let (_, repeated) = send(
                &router,
                Method::PUT,
                &completion_uri,
                Some(&jane),
                r#"{"completed": true}"#,
            )
            .await;
            assert_eq!(false, repeated["changed"]);

            let (_, everything) = send(&router, Method::GET, "/todos", Some(&jane), "").await;
            assert_eq!(1, everything["stats"]["completed"]);
            assert_eq!(0, everything["stats"]["pending"]);

            let (_, pending_only) = send(
                &router,
                Method::GET,
                "/todos?show_completed=false",
                Some(&jane),
                "",
            )
            .await;
            assert_eq!(Some(0), pending_only["todos"].as_array().map(Vec::len));
            assert_eq!(0, pending_only["stats"]["total"]);

            let (status, toggled) = send(
                &router,
                Method::POST,
                &format!("{todo_uri}/toggle"),
                Some(&jane),
                "",
            )
            .await;
            assert_eq!(StatusCode::OK, status);
            assert_eq!("Todo marked as uncompleted", toggled["message"]);

            let (status, _) = send(&router, Method::DELETE, &todo_uri, Some(&mallory), "").await;
            assert_eq!(StatusCode::NOT_FOUND, status);

            let (status, deleted) = send(&router, Method::DELETE, &todo_uri, Some(&jane), "").await;
            assert_eq!(StatusCode::OK, status);
            assert_eq!("Todo deleted successfully!", deleted["message"]);
        })
    });
}
