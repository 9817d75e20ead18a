use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;

use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{openapi, ToResponse, ToSchema};

use validator::ValidationErrors;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToResponse)]
#[response(examples(
    ("Not Found" = (
        summary = "Todo is missing or belongs to someone else (404)",
        value = json!({
            "error_code": "not_found",
            "error_description": "Todo not found or access denied",
            "extra_info": null
        })
    )),

    ("Unauthorized" = (
        summary = "Missing, expired or forged session token (401)",
        value = json!({
            "error_code": "unauthorized",
            "error_description": "A valid session token is required.",
            "extra_info": "Expected a bearer token in the Authorization header"
        })
    )),

    ("Conflict" = (
        summary = "The request collides with existing data (409)",
        value = json!({
            "error_code": "conflict",
            "error_description": "An account with this email already exists",
            "extra_info": null
        })
    )),

    ("Internal Failure" = (
        summary = "Something unexpected went wrong inside the server (500)",
        value = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )),

    ("Invalid Input" = (
        summary = "Invalid request body was passed (400)",
        value = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": {
                "password": [
                    {
                        "code": "length",
                        "message": null,
                        "params": {
                            "value": "short",
                            "min": 8
                        }
                    }
                ]
            }
        })
    )),

    ("Malformed JSON" = (
        summary = "Invalid JSON passed to server (400)",
        value = json!({
            "error_code": "invalid_json",
            "error_description": "The passed request body contained malformed or unreadable JSON.",
            "extra_info": "Failed to parse the request body as JSON: EOF while parsing an object at line 4 column 0"
        })
    ))
))]
pub struct BasicErrorResponse {
    error_code: String,
    error_description: String,
    extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

fn basic_error(
    status: StatusCode,
    error_code: &str,
    error_description: impl Into<String>,
    extra_info: Option<ExtraInfo>,
) -> Response {
    (
        status,
        axum::Json(BasicErrorResponse {
            error_code: error_code.to_owned(),
            error_description: error_description.into(),
            extra_info,
        }),
    )
        .into_response()
}

/// Response type for failures in driven ports. The underlying error is logged by the handler
/// and never sent to the client.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        basic_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Could not access data to complete your request",
            None,
        )
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        basic_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Submitted data was invalid.",
            Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
        )
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Input that passed DTO validation but was rejected by business rules
pub struct InvalidInputResponse(pub String);

impl IntoResponse for InvalidInputResponse {
    fn into_response(self) -> Response {
        basic_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Submitted data was invalid.",
            Some(ExtraInfo::Message(self.0)),
        )
    }
}

pub struct NotFoundResponse(pub String);

impl IntoResponse for NotFoundResponse {
    fn into_response(self) -> Response {
        basic_error(StatusCode::NOT_FOUND, "not_found", self.0, None)
    }
}

pub struct ConflictResponse(pub String);

impl IntoResponse for ConflictResponse {
    fn into_response(self) -> Response {
        basic_error(StatusCode::CONFLICT, "conflict", self.0, None)
    }
}

/// Rejects a request that lacks a usable session. The description stays generic; the detail
/// goes in `extra_info`.
pub struct UnauthorizedResponse(pub String);

impl IntoResponse for UnauthorizedResponse {
    fn into_response(self) -> Response {
        basic_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "A valid session token is required.",
            Some(ExtraInfo::Message(self.0)),
        )
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
#[cfg_attr(test, derive(Debug))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        basic_error(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            "The passed request body contained malformed or unreadable JSON.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}
