//! Core business logic, independent of any presentation layer.

/// Authentication against stored password hashes
pub mod auth;
/// Cart accumulation and transactional checkout
pub mod cart;
/// Stock-change notifications for observers such as dashboards
pub mod events;
/// Catalog snapshot export as CSV
pub mod export;
/// bcrypt password hashing
pub mod password;
/// Catalog repository
pub mod product;
/// Dashboard figures derived from the catalog and sales views
pub mod report;
/// Sales repository and aggregate views
pub mod sale;
/// Identity repository
pub mod user;
