//! Authentication service.
//!
//! An unknown username and a wrong password produce the same
//! [`Error::AuthenticationDenied`] after the same bcrypt work, so neither the
//! message nor the response time reveals which accounts exist.

use crate::{
    core::{
        password,
        user::{self, UserSummary},
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

/// Verifies a credential and returns the matching account.
///
/// An unknown username still costs one bcrypt verification at
/// `bcrypt_cost`, the factor accounts are hashed with, so response time does
/// not reveal which usernames exist.
///
/// # Errors
/// Returns `Error::AuthenticationDenied` when the username is unknown, the
/// password does not match, or the stored hash is unusable. Store failures
/// propagate as `Error::Database`.
#[instrument(skip(db, password))]
pub async fn login(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    bcrypt_cost: Option<u32>,
) -> Result<UserSummary> {
    let Some(account) = user::find_user_by_username(db, username).await? else {
        password::verify_against_dummy(password, bcrypt_cost).await?;
        info!("Login denied");
        return Err(Error::AuthenticationDenied);
    };

    match password::verify_password(password, &account.password_hash).await {
        Ok(true) => {
            info!(user_id = account.id, "Login succeeded");
            Ok(account.into())
        }
        Ok(false) => {
            info!("Login denied");
            Err(Error::AuthenticationDenied)
        }
        Err(e) => {
            warn!(user_id = account.id, "Stored password hash is unusable: {}", e);
            Err(Error::AuthenticationDenied)
        }
    }
}
