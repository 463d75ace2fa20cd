//! Shared test utilities for stockroom.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        product::{self, ProductDraft},
        sale,
        user::{self, NewUser, UserSummary},
    },
    entities::{self, Role},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = crate::config::database::create_connection("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test product with the given price and stock.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    quantity: i32,
) -> Result<entities::product::Model> {
    product::create_product(db, ProductDraft::new(name, price, quantity)).await
}

/// Creates a test user whose password equals its username.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
) -> Result<UserSummary> {
    user::create_user(
        db,
        NewUser {
            username: username.to_string(),
            password: username.to_string(),
            role,
        },
        Some(TEST_BCRYPT_COST),
    )
    .await
}

/// Records a sale through the repository (timestamp = now).
pub async fn record_test_sale(
    db: &DatabaseConnection,
    product_id: i64,
    user_id: i64,
    quantity: i32,
    unit_price: f64,
) -> Result<entities::sale::Model> {
    sale::record_sale(db, product_id, user_id, quantity, unit_price).await
}

/// Inserts a sale line with a fixed timestamp, bypassing the repository clock.
pub async fn insert_sale_at(
    db: &DatabaseConnection,
    product_id: i64,
    user_id: i64,
    quantity: i32,
    unit_price: f64,
    sale_date: DateTime<Utc>,
) -> Result<entities::sale::Model> {
    let sale = entities::sale::ActiveModel {
        product_id: Set(product_id),
        user_id: Set(user_id),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        sale_date: Set(sale_date),
        ..Default::default()
    };
    sale.insert(db).await.map_err(Into::into)
}

/// Sets up a complete test environment with one product and one employee.
/// Returns (db, product, user) for sale-related tests.
///
/// # Defaults
/// * product: "Widget", price 9.90, stock 5
/// * user: "cashier", `EMPLOYEE`
pub async fn setup_with_product_and_user()
-> Result<(DatabaseConnection, entities::product::Model, UserSummary)> {
    let db = setup_test_db().await?;
    let product = create_test_product(&db, "Widget", 9.90, 5).await?;
    let user = create_test_user(&db, "cashier", Role::Employee).await?;
    Ok((db, product, user))
}
