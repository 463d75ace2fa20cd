//! Application settings loading from config.toml
//!
//! Every section is optional. A file that only names a database URL is as
//! valid as one that also lists bootstrap accounts.

use super::users::SeedUserConfig;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Store URL; `DATABASE_URL` in the environment takes precedence
    pub database_url: Option<String>,
    /// Password hashing settings
    pub security: SecurityConfig,
    /// Dashboard windows
    pub dashboard: DashboardConfig,
    /// Accounts created on start when their username is absent
    pub seed_users: Vec<SeedUserConfig>,
}

/// Password hashing settings
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// bcrypt cost factor (4..=31)
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Dashboard aggregation windows
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Days covered by the daily revenue view
    pub days_back: u32,
    /// Number of products in the top-seller view
    pub top_selling_limit: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            days_back: 7,
            top_selling_limit: 5,
        }
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type, or `bcrypt_cost` is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    let cost = config.security.bcrypt_cost;
    if !(4..=31).contains(&cost) {
        return Err(Error::Config {
            message: format!("bcrypt_cost must be between 4 and 31, got {cost}"),
        });
    }

    Ok(config)
}

/// Loads application configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<AppConfig> {
    load_config("config.toml")
}
