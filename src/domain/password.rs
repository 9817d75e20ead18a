//! Password hashing with Argon2id. Each hash gets its own random salt and is stored as a PHC
//! string, so the parameters travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use anyhow::Context;
use argon2::Argon2;
use std::sync::LazyLock;
use thiserror::Error;

/// Shortest password accepted at registration
pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("stored password hash is unreadable: {0}")]
    InvalidHash(argon2::password_hash::Error),
    #[error("failed to verify password: {0}")]
    Verify(argon2::password_hash::Error),
}

/// Hash checked against when a login names an unknown account, so that a miss costs about as
/// much time as a wrong password
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("decoy password for unknown accounts").ok());

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;

    Ok(hash.to_string())
}

/// `Ok(false)` means the password is wrong; errors are reserved for hashes that can't be used
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::Verify(err)),
    }
}

/// Burns roughly the same time as [verify_password] without revealing anything
pub fn verify_against_decoy(password: &str) {
    if let Some(decoy) = DECOY_HASH.as_deref() {
        let _ = verify_password(password, decoy);
    }
}

/// [hash_password] on tokio's blocking pool, keeping Argon2's work off the request workers
pub async fn hash_password_blocking(password: &str) -> Result<String, anyhow::Error> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task did not finish")??;

    Ok(hash)
}

/// [verify_password] on tokio's blocking pool
pub async fn verify_password_blocking(password: &str, hash: &str) -> Result<bool, anyhow::Error> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("password verification task did not finish")??;

    Ok(matches)
}

/// [verify_against_decoy] on tokio's blocking pool
pub async fn verify_against_decoy_blocking(password: &str) {
    let password = password.to_owned();
    let _ = tokio::task::spawn_blocking(move || verify_against_decoy(&password)).await;
}
