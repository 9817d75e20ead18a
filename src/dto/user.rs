use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for signing up a new account via the API. The email is checked by the domain after it
/// is trimmed and case-folded.
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{email}")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewAccount {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(min = 8))]
    #[schema(example = "Secret1!")]
    pub password: String,
    #[validate(must_match = "password")]
    #[schema(example = "Secret1!")]
    pub password_confirm: String,
}

/// DTO returned after an account is created
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct RegisteredAccount {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Account created successfully! Please log in.")]
    pub message: String,
}

#[derive(Deserialize, Display, ToSchema)]
#[display("{email}")]
#[cfg_attr(test, derive(Serialize))]
pub struct LoginRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "Secret1!")]
    pub password: String,
}

/// DTO carrying the bearer token to send on every todo request
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct LoginResponse {
    #[schema(example = "Login successful!")]
    pub message: String,
    pub token: String,
}
