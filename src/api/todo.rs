use crate::api::auth::AuthenticatedUser;
use crate::domain::todo::driving_ports::{TodoError, TodoPort};
use crate::domain::user::Session;
use crate::domain::StatusChange;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, GenericErrorResponse, InvalidInputResponse, Json, NotFoundResponse,
    UnauthorizedResponse, ValidationErrorResponse,
};
use crate::{domain, dto, persistence, AppState, SharedData};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_todos,
        get_todo,
        create_todo,
        update_todo,
        set_todo_completion,
        toggle_todo,
        delete_todo
    ),
    components(schemas(
        dto::todo::NewTodo,
        dto::todo::UpdateTodo,
        dto::todo::SetCompletion,
        dto::todo::TodoItem,
        dto::todo::TodoStats,
        dto::todo::TodoListing,
        dto::todo::TodoConfirmation,
        dto::todo::CompletionConfirmation,
        dto::todo::MessageResponse,
    ))
)]
/// Defines the OpenAPI documentation for the todo API
pub struct TodoApi;
/// Constant used to group todo endpoints in OpenAPI documentation
pub const TODO_API_GROUP: &str = "Todos";

/// Builds a router for the routes under "/todos". Every route requires a session token.
pub fn todo_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_state): AppState,
                 AuthenticatedUser(session): AuthenticatedUser,
                 Query(query): Query<dto::todo::ListTodosQuery>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    list_todos(&session, query, &mut ext_cxn, &todo_service).await
                },
            )
            .post(
                |State(app_state): AppState,
                 AuthenticatedUser(session): AuthenticatedUser,
                 Json(new_todo): Json<dto::todo::NewTodo>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    create_todo(&session, new_todo, &mut ext_cxn, &todo_service).await
                },
            ),
        )
        .route(
            "/:todo_id",
            get(
                |State(app_state): AppState,
                 AuthenticatedUser(session): AuthenticatedUser,
                 Path(todo_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    get_todo(&session, todo_id, &mut ext_cxn, &todo_service).await
                },
            )
            .patch(
                |State(app_state): AppState,
                 AuthenticatedUser(session): AuthenticatedUser,
                 Path(todo_id): Path<i32>,
                 Json(update): Json<dto::todo::UpdateTodo>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    update_todo(&session, todo_id, update, &mut ext_cxn, &todo_service).await
                },
            )
            .delete(
                |State(app_state): AppState,
                 AuthenticatedUser(session): AuthenticatedUser,
                 Path(todo_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    delete_todo(&session, todo_id, &mut ext_cxn, &todo_service).await
                },
            ),
        )
        .route(
            "/:todo_id/completion",
            put(
                |State(app_state): AppState,
                 AuthenticatedUser(session): AuthenticatedUser,
                 Path(todo_id): Path<i32>,
                 Json(completion): Json<dto::todo::SetCompletion>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    set_todo_completion(&session, todo_id, completion, &mut ext_cxn, &todo_service)
                        .await
                },
            ),
        )
        .route(
            "/:todo_id/toggle",
            post(
                |State(app_state): AppState,
                 AuthenticatedUser(session): AuthenticatedUser,
                 Path(todo_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    toggle_todo(&session, todo_id, &mut ext_cxn, &todo_service).await
                },
            ),
        )
}

/// Turns a failed todo operation into the matching HTTP error, logging infrastructure failures
fn todo_error_response(err: TodoError) -> ErrorResponse {
    match err {
        TodoError::Invalid(text_err) => InvalidInputResponse(text_err.to_string()).into(),
        err @ TodoError::NotFound => NotFoundResponse(err.to_string()).into(),
        TodoError::UserDoesNotExist => {
            UnauthorizedResponse("The account for this session no longer exists".to_owned()).into()
        }
        TodoError::PortError(port_err) => {
            error!("Todo operation failed: {port_err:#}");
            GenericErrorResponse(port_err).into()
        }
    }
}

fn completion_confirmation(
    message: String,
    completed: bool,
    changed: bool,
) -> Json<dto::todo::CompletionConfirmation> {
    Json(dto::todo::CompletionConfirmation {
        message,
        completed,
        changed,
    })
}

#[utoipa::path(
    get,
    path = "/todos",
    tag = TODO_API_GROUP,
    params(dto::todo::ListTodosQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user's todos, newest first", body = dto::todo::TodoListing),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Lists the logged-in user's todos along with completion stats
async fn list_todos(
    session: &Session,
    query: dto::todo::ListTodosQuery,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::todo::TodoListing>, ErrorResponse> {
    info!(
        "Listing todos for user {} (show completed: {})",
        session.user_id, query.show_completed
    );
    let todo_read = persistence::db_todo_driven_ports::DbTodoReader;

    let listing = todo_service
        .todos_for_user(session, query.show_completed, &mut *ext_cxn, &todo_read)
        .await
        .map_err(todo_error_response)?;

    Ok(Json(listing.into()))
}

#[utoipa::path(
    get,
    path = "/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(("todo_id" = i32, Path, description = "ID of the todo")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The todo", body = dto::todo::TodoItem),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Retrieves one of the logged-in user's todos
async fn get_todo(
    session: &Session,
    todo_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::todo::TodoItem>, ErrorResponse> {
    info!("Get todo {todo_id} for user {}", session.user_id);
    let todo_read = persistence::db_todo_driven_ports::DbTodoReader;

    let todo = todo_service
        .user_todo_by_id(session, todo_id, &mut *ext_cxn, &todo_read)
        .await
        .map_err(todo_error_response)?
        .ok_or_else(|| todo_error_response(TodoError::NotFound))?;

    Ok(Json(todo.into()))
}

#[utoipa::path(
    post,
    path = "/todos",
    tag = TODO_API_GROUP,
    request_body = dto::todo::NewTodo,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Todo created", body = dto::todo::TodoConfirmation),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Adds a todo for the logged-in user
async fn create_todo(
    session: &Session,
    new_todo: dto::todo::NewTodo,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<(StatusCode, Json<dto::todo::TodoConfirmation>), ErrorResponse> {
    info!("Adding todo for user {}", session.user_id);
    new_todo.validate().map_err(ValidationErrorResponse::from)?;

    let domain_todo = domain::todo::NewTodo::from(new_todo);
    let user_detect = persistence::db_user_driven_ports::DbDetectUser;
    let todo_write = persistence::db_todo_driven_ports::DbTodoWriter;

    let created = todo_service
        .create_todo(session, &domain_todo, &mut *ext_cxn, &user_detect, &todo_write)
        .await
        .map_err(todo_error_response)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    patch,
    path = "/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(("todo_id" = i32, Path, description = "ID of the todo")),
    request_body = dto::todo::UpdateTodo,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Todo updated", body = dto::todo::TodoConfirmation),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Replaces a todo's title and description
async fn update_todo(
    session: &Session,
    todo_id: i32,
    update: dto::todo::UpdateTodo,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::todo::TodoConfirmation>, ErrorResponse> {
    info!("Updating todo {todo_id} for user {}", session.user_id);
    let domain_update = domain::todo::UpdateTodo::from(update);
    let todo_read = persistence::db_todo_driven_ports::DbTodoReader;
    let todo_write = persistence::db_todo_driven_ports::DbTodoWriter;

    let updated = todo_service
        .update_todo(
            session,
            todo_id,
            &domain_update,
            &mut *ext_cxn,
            &todo_read,
            &todo_write,
        )
        .await
        .map_err(todo_error_response)?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    put,
    path = "/todos/{todo_id}/completion",
    tag = TODO_API_GROUP,
    params(("todo_id" = i32, Path, description = "ID of the todo")),
    request_body = dto::todo::SetCompletion,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Todo is in the requested state", body = dto::todo::CompletionConfirmation),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Marks a todo completed or pending. Asking for the state it's already in changes nothing.
async fn set_todo_completion(
    session: &Session,
    todo_id: i32,
    completion: dto::todo::SetCompletion,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::todo::CompletionConfirmation>, ErrorResponse> {
    info!(
        "Setting todo {todo_id} completion to {} for user {}",
        completion.completed, session.user_id
    );
    let todo_read = persistence::db_todo_driven_ports::DbTodoReader;
    let todo_write = persistence::db_todo_driven_ports::DbTodoWriter;

    let outcome = todo_service
        .set_todo_completion(
            session,
            todo_id,
            completion.completed,
            &mut *ext_cxn,
            &todo_read,
            &todo_write,
        )
        .await
        .map_err(todo_error_response)?;

    Ok(completion_confirmation(
        outcome.message,
        completion.completed,
        outcome.value == StatusChange::Changed,
    ))
}

#[utoipa::path(
    post,
    path = "/todos/{todo_id}/toggle",
    tag = TODO_API_GROUP,
    params(("todo_id" = i32, Path, description = "ID of the todo")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Todo flipped", body = dto::todo::CompletionConfirmation),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Flips a todo between completed and pending
async fn toggle_todo(
    session: &Session,
    todo_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::todo::CompletionConfirmation>, ErrorResponse> {
    info!("Toggling todo {todo_id} for user {}", session.user_id);
    let todo_write = persistence::db_todo_driven_ports::DbTodoWriter;

    let outcome = todo_service
        .toggle_todo(session, todo_id, &mut *ext_cxn, &todo_write)
        .await
        .map_err(todo_error_response)?;

    Ok(completion_confirmation(outcome.message, outcome.value, true))
}

#[utoipa::path(
    delete,
    path = "/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(("todo_id" = i32, Path, description = "ID of the todo")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Todo deleted", body = dto::todo::MessageResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Deletes a todo
async fn delete_todo(
    session: &Session,
    todo_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::todo::MessageResponse>, ErrorResponse> {
    info!("Deleting todo {todo_id} for user {}", session.user_id);
    let todo_write = persistence::db_todo_driven_ports::DbTodoWriter;

    let outcome = todo_service
        .delete_todo(session, todo_id, &mut *ext_cxn, &todo_write)
        .await
        .map_err(todo_error_response)?;

    Ok(Json(dto::todo::MessageResponse {
        message: outcome.message,
    }))
}
