use crate::SharedData;
use axum::Router;
use std::sync::Arc;

pub mod auth;
pub mod swagger_main;
pub mod todo;

#[cfg(test)]
pub mod test_util;

/// Assembles every route the service exposes
pub fn build_router(shared_data: Arc<SharedData>) -> Router {
    Router::new()
        .nest("/auth", auth::auth_routes())
        .nest("/todos", todo::todo_routes())
        .merge(swagger_main::build_documentation())
        .with_state(shared_data)
}
