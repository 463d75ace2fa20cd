//! Password hashing and verification.
//!
//! bcrypt embeds a fresh random salt in every hash, so hashing the same
//! plaintext twice yields two different strings that both verify. Both calls
//! are CPU-bound and run on the blocking pool.
//!
//! bcrypt only reads the first [`MAX_PASSWORD_LENGTH`] bytes of its input, so
//! longer passwords are refused instead of silently truncated.

use crate::errors::{Error, Result};
use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

/// Longest password bcrypt hashes without truncation, in bytes.
pub const MAX_PASSWORD_LENGTH: usize = 72;

const DUMMY_PASSWORD: &str = "stockroom-dummy-credential";

// One throwaway hash per cost factor, built on first use.
static DUMMY_HASHES: OnceLock<Mutex<HashMap<u32, String>>> = OnceLock::new();

/// Checks that `password` is non-empty and fits bcrypt's input limit.
///
/// # Errors
/// Returns `Error::Validation` for an empty password or one longer than
/// [`MAX_PASSWORD_LENGTH`] bytes.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::validation("Password cannot be empty"));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(Error::validation(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Hashes `password` with bcrypt at `cost`, or [`bcrypt::DEFAULT_COST`].
///
/// # Errors
/// Returns `Error::Validation` if the password fails [`validate_password`],
/// and `Error::PasswordHash` if bcrypt rejects the cost or the worker task
/// fails.
pub async fn hash_password(password: &str, cost: Option<u32>) -> Result<String> {
    validate_password(password)?;
    let password = password.to_string();
    let cost = cost.unwrap_or(bcrypt::DEFAULT_COST);

    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password, cost).map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
    })
    .await
    .map_err(|e| Error::PasswordHash {
        message: format!("Task join error: {e}"),
    })?
}

/// Checks `password` against a stored bcrypt `hash`.
///
/// A password longer than [`MAX_PASSWORD_LENGTH`] never matches, since no
/// such password can have been hashed.
///
/// # Errors
/// Returns `Error::PasswordHash` if `hash` is not a valid bcrypt string or
/// the worker task fails.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Ok(false);
    }
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hash).map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
    })
    .await
    .map_err(|e| Error::PasswordHash {
        message: format!("Task join error: {e}"),
    })?
}

/// Runs a full verification against a throwaway hash at `cost` and returns
/// `false`.
///
/// Login calls this for unknown usernames so they take as long as a wrong
/// password for a real account.
///
/// # Errors
/// Returns `Error::PasswordHash` if the throwaway hash cannot be built.
pub async fn verify_against_dummy(password: &str, cost: Option<u32>) -> Result<bool> {
    let hash = dummy_hash(cost.unwrap_or(bcrypt::DEFAULT_COST)).await?;
    // The dummy plaintext is never a real credential.
    let _ = verify_password(password, &hash).await?;
    Ok(false)
}

async fn dummy_hash(cost: u32) -> Result<String> {
    let cache = DUMMY_HASHES.get_or_init(Mutex::default);
    if let Some(hash) = cache
        .lock()
        .ok()
        .and_then(|hashes| hashes.get(&cost).cloned())
    {
        return Ok(hash);
    }

    let hash = hash_password(DUMMY_PASSWORD, Some(cost)).await?;
    if let Ok(mut hashes) = cache.lock() {
        hashes.insert(cost, hash.clone());
    }
    Ok(hash)
}
