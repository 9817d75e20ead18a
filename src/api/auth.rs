//! Account routes and the session token that authenticates every todo request.
//!
//! A successful login hands back an HS256-signed JWT naming the user. Handlers that act on a
//! user's data take an [AuthenticatedUser], which verifies the `Authorization: Bearer` header and
//! turns the token back into a [Session].

use crate::domain::user::driving_ports::{AuthError, AuthPort, RegisterError};
use crate::domain::user::Session;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, ConflictResponse, GenericErrorResponse, InvalidInputResponse, Json,
    UnauthorizedResponse, ValidationErrorResponse,
};
use crate::{domain, dto, persistence, AppState, SharedData};
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::ErrorResponse;
use axum::routing::post;
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(
    paths(register, login),
    components(schemas(
        dto::user::NewAccount,
        dto::user::RegisteredAccount,
        dto::user::LoginRequest,
        dto::user::LoginResponse,
    ))
)]
/// Defines the OpenAPI documentation for the account API
pub struct AuthApi;
/// Constant used to group account endpoints in OpenAPI documentation
pub const AUTH_API_GROUP: &str = "Accounts";

const TOKEN_ISSUER: &str = "todo-manager";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i32,
    email: String,
    iss: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Error)]
pub enum SessionTokenError {
    #[error("failed to sign session token: {0}")]
    Sign(jsonwebtoken::errors::Error),
    #[error("Session has expired, please log in again")]
    Expired,
    #[error("Session token is invalid")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Signs and checks session tokens
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, session: &Session) -> Result<String, SessionTokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: session.user_id,
            email: session.email.clone(),
            iss: TOKEN_ISSUER.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(SessionTokenError::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Session, SessionTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);

        let token_data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            if matches!(err.kind(), ErrorKind::ExpiredSignature) {
                SessionTokenError::Expired
            } else {
                SessionTokenError::Invalid(err)
            }
        })?;

        Ok(Session {
            user_id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, UnauthorizedResponse> {
    let header_value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| UnauthorizedResponse("Missing Authorization header".to_owned()))?
        .to_str()
        .map_err(|_| UnauthorizedResponse("Authorization header is not valid text".to_owned()))?;

    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            UnauthorizedResponse("Expected a bearer token in the Authorization header".to_owned())
        })
}

/// Extractor for the session of the user making a request
pub struct AuthenticatedUser(pub Session);

#[axum::async_trait]
impl FromRequestParts<Arc<SharedData>> for AuthenticatedUser {
    type Rejection = UnauthorizedResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SharedData>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let session = state.session_keys.verify(token).map_err(|err| {
            warn!("Rejected session token: {err}");
            UnauthorizedResponse(err.to_string())
        })?;

        Ok(AuthenticatedUser(session))
    }
}

/// Builds a router for the account routes
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/register",
            post(
                |State(app_state): AppState,
                 Json(new_account): Json<dto::user::NewAccount>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    register(new_account, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/login",
            post(
                |State(app_state): AppState,
                 Json(credentials): Json<dto::user::LoginRequest>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    login(
                        credentials,
                        &app_state.session_keys,
                        &mut ext_cxn,
                        &user_service,
                    )
                    .await
                },
            ),
        )
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = AUTH_API_GROUP,
    request_body = dto::user::NewAccount,
    responses(
        (status = 201, description = "Account created", body = dto::user::RegisteredAccount),
        (status = 400, response = BasicErrorResponse),
        (status = 409, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Creates an account
async fn register(
    new_account: dto::user::NewAccount,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl AuthPort,
) -> Result<(StatusCode, Json<dto::user::RegisteredAccount>), ErrorResponse> {
    info!("Attempt to register account: {}", new_account);
    new_account
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let user_detect = persistence::db_user_driven_ports::DbDetectUser;
    let user_write = persistence::db_user_driven_ports::DbWriteUsers;
    let register_result = user_service
        .register(
            &new_account.email,
            &new_account.password,
            &mut *ext_cxn,
            &user_detect,
            &user_write,
        )
        .await;

    match register_result {
        Ok(outcome) => Ok((
            StatusCode::CREATED,
            Json(dto::user::RegisteredAccount {
                id: outcome.value,
                message: outcome.message,
            }),
        )),
        Err(RegisterError::Invalid(err)) => Err(InvalidInputResponse(err.to_string()).into()),
        Err(err @ RegisterError::EmailTaken) => Err(ConflictResponse(err.to_string()).into()),
        Err(RegisterError::PortError(err)) => {
            error!("Account registration failed: {err:#}");
            Err(GenericErrorResponse(err).into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = AUTH_API_GROUP,
    request_body = dto::user::LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = dto::user::LoginResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Exchanges an email and password for a session token
async fn login(
    credentials: dto::user::LoginRequest,
    session_keys: &SessionKeys,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl AuthPort,
) -> Result<Json<dto::user::LoginResponse>, ErrorResponse> {
    info!("Login attempt for {}", credentials);
    let user_read = persistence::db_user_driven_ports::DbReadUsers;

    let auth_result = user_service
        .authenticate(
            &credentials.email,
            &credentials.password,
            &mut *ext_cxn,
            &user_read,
        )
        .await;
    let outcome = match auth_result {
        Ok(outcome) => outcome,
        Err(err @ AuthError::InvalidCredentials) => {
            return Err(UnauthorizedResponse(err.to_string()).into());
        }
        Err(AuthError::PortError(err)) => {
            error!("Login failed: {err:#}");
            return Err(GenericErrorResponse(err).into());
        }
    };

    let token = session_keys.issue(&outcome.value).map_err(|err| {
        error!("Could not sign session token: {err}");
        GenericErrorResponse(err.into())
    })?;

    Ok(Json(dto::user::LoginResponse {
        message: outcome.message,
        token,
    }))
}
