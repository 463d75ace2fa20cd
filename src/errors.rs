//! Unified error type for the catalog, sales, identity and checkout layers.

use thiserror::Error;

/// Every failure the crate can surface to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity or query failure reported by the store. Never retried.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input rejected before touching the store.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// No product with this id.
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// No user with this id.
    #[error("User not found: {id}")]
    UserNotFound {
        /// Requested user id
        id: i64,
    },

    /// Another product already uses this name (case-insensitive).
    #[error("Product '{name}' already exists")]
    DuplicateProductName {
        /// Conflicting name
        name: String,
    },

    /// Another account already uses this username.
    #[error("Username '{username}' already exists")]
    DuplicateUsername {
        /// Conflicting username
        username: String,
    },

    /// Sale rows still reference this user.
    #[error("User {id} has recorded sales and cannot be deleted")]
    UserHasSales {
        /// User id
        id: i64,
    },

    /// Requested quantity exceeds stock on hand.
    #[error("Insufficient stock for '{product}': only {available} available, {requested} requested")]
    InsufficientStock {
        /// Product name
        product: String,
        /// Stock on hand
        available: i32,
        /// Total quantity that was asked for
        requested: i32,
    },

    /// Login failed. Deliberately does not say whether the user exists.
    #[error("Invalid credentials")]
    AuthenticationDenied,

    /// The acting user lacks the required role.
    #[error("Forbidden: {action} requires an administrator")]
    Forbidden {
        /// What was attempted
        action: String,
    },

    /// The cart holds no line with this handle.
    #[error("Cart line not found: {line_id}")]
    CartLineNotFound {
        /// Line handle
        line_id: u64,
    },

    /// bcrypt failed, or its worker task did not complete.
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Underlying failure
        message: String,
    },

    /// CSV serialization failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Integer conversion out of range.
    #[error("Conversion error: {0}")]
    Conversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
