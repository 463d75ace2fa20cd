//! Bootstrap account definitions.
//!
//! A fresh store has no accounts, so nobody could log in to create the first
//! administrator. config.toml may list accounts that are created on start
//! when their username does not exist yet.

use crate::entities::Role;
use serde::Deserialize;

/// One account to create on start
#[derive(Clone, Deserialize)]
pub struct SeedUserConfig {
    /// Login name
    pub username: String,
    /// Plaintext password, hashed before it reaches the store
    pub password: String,
    /// Access level
    pub role: Role,
}

// Keeps the plaintext out of logs.
impl std::fmt::Debug for SeedUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}
