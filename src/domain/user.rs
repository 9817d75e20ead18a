use crate::domain::password::{self, MIN_PASSWORD_CHARS};
use crate::domain::Outcome;
use crate::domain::user::driving_ports::{AuthError, CredentialError, RegisterError};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, warn};

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TodoUser {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user account ready to be stored: email already normalized, password already hashed
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
}

/// Identity of the logged-in user, passed explicitly into every operation acting on their data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i32,
    pub email: String,
}

/// Emails are compared and stored trimmed and case-folded
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub mod driven_ports {
    use super::*;

    pub trait UserReader {
        async fn user_by_email(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoUser>, anyhow::Error>;
    }

    pub trait UserWriter {
        /// Stores a new user, returning its id, or [None] if the email is already taken
        async fn create_user(
            &self,
            user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<i32>, anyhow::Error>;
    }

    pub trait DetectUser {
        async fn user_exists(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        async fn user_with_email_exists(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error, Clone, PartialEq, Eq)]
    pub enum CredentialError {
        #[error("Please enter an email address")]
        MissingEmail,
        #[error("Please enter a valid email address")]
        MalformedEmail,
        #[error("Password must be at least {} characters", MIN_PASSWORD_CHARS)]
        PasswordTooShort,
    }

    #[derive(Debug, Error)]
    pub enum RegisterError {
        #[error(transparent)]
        Invalid(#[from] CredentialError),
        #[error("An account with this email already exists")]
        EmailTaken,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum AuthError {
        /// Deliberately the same for unknown emails and wrong passwords
        #[error("Invalid email or password")]
        InvalidCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait AuthPort {
        async fn register(
            &self,
            email: &str,
            password: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl driven_ports::DetectUser,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<Outcome<i32>, RegisterError>;

        async fn authenticate(
            &self,
            email: &str,
            password: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Outcome<Session>, AuthError>;
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), CredentialError> {
    if email.is_empty() {
        return Err(CredentialError::MissingEmail);
    }
    if !validator::validate_email(email) {
        return Err(CredentialError::MalformedEmail);
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(CredentialError::PasswordTooShort);
    }

    Ok(())
}

#[derive(Debug, Error)]
pub(super) enum UserExistsErr {
    #[error("user with ID {0} does not exist")]
    UserDoesNotExist(i32),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

pub(super) async fn verify_user_exists(
    id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_detect: &impl driven_ports::DetectUser,
) -> Result<(), UserExistsErr> {
    let does_user_exist = user_detect.user_exists(id, ext_cxn).await?;

    if does_user_exist {
        Ok(())
    } else {
        Err(UserExistsErr::UserDoesNotExist(id))
    }
}

pub struct UserService {}

impl driving_ports::AuthPort for UserService {
    async fn register(
        &self,
        email: &str,
        password: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl driven_ports::DetectUser,
        u_writer: &impl driven_ports::UserWriter,
    ) -> Result<Outcome<i32>, RegisterError> {
        let email = normalize_email(email);
        check_credentials(&email, password)?;

        let email_taken = u_detect
            .user_with_email_exists(&email, &mut *ext_cxn)
            .await
            .context("looking up email during registration")?;
        if email_taken {
            return Err(RegisterError::EmailTaken);
        }

        let password_hash = password::hash_password_blocking(password)
            .await
            .context("hashing password during registration")?;
        let new_user = CreateUser {
            email,
            password_hash,
        };

        // The writer reports a lost race for the same email as None
        let created_id = u_writer
            .create_user(&new_user, &mut *ext_cxn)
            .await
            .context("storing new user")?
            .ok_or(RegisterError::EmailTaken)?;

        Ok(Outcome::new(
            created_id,
            "Account created successfully! Please log in.",
        ))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Outcome<Session>, AuthError> {
        let email = normalize_email(email);
        let user = u_reader
            .user_by_email(&email, &mut *ext_cxn)
            .await
            .context("looking up user during login")?;

        let Some(user) = user else {
            password::verify_against_decoy_blocking(password).await;
            return Err(AuthError::InvalidCredentials);
        };

        let password_matches = password::verify_password_blocking(password, &user.password_hash)
            .await
            .inspect_err(|err| error!("Stored credentials for user {} are unusable: {err:#}", user.id))
            .context("verifying password during login")?;
        if !password_matches {
            warn!("Failed login attempt for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Outcome::new(
            Session {
                user_id: user.id,
                email: user.email,
            },
            "Login successful!",
        ))
    }
}
