use crate::routing_utils::{BasicErrorResponse, ExtraInfo, ValidationErrorSchema};
use utoipa::OpenApi;

pub mod todo;
pub mod user;

/// Schemas shared by every part of the API, merged into the main documentation
#[derive(OpenApi)]
#[openapi(components(
    schemas(ExtraInfo, ValidationErrorSchema),
    responses(BasicErrorResponse)
))]
pub struct OpenApiSchemas;
