//! Database configuration module for stockroom.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.
//! The only hand-written DDL is the case-insensitive product name index, which
//! `SeaORM` cannot express from the entity alone.
//!
//! `COLLATE NOCASE` folds ASCII letters only. "Widget" and "WIDGET" collide,
//! but "Émile" and "émile" are distinct names to the store.

use crate::entities::{Product, Sale, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Fallback store location when neither the environment nor config.toml names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/stockroom.sqlite?mode=rwc";

const CREATE_PRODUCT_NAME_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_products_name_nocase ON products (name COLLATE NOCASE)";

/// Resolves the database URL.
///
/// `DATABASE_URL` in the environment wins, then the value from config.toml,
/// then [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the store at `database_url`.
///
/// For a file-backed `SQLite` URL the parent directory is created first.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url)
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }
    debug!("Opening database connection");
    Database::connect(database_url).await.map_err(Into::into)
}

fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory") {
        return None;
    }
    Some(Path::new(path))
}

/// Creates all tables if they do not exist yet.
///
/// Order matters: `sales` carries foreign keys to `products` and `users`.
/// Safe to call on every start.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut product_table = schema.create_table_from_entity(Product);
    let mut user_table = schema.create_table_from_entity(User);
    let mut sale_table = schema.create_table_from_entity(Sale);

    product_table.if_not_exists();
    user_table.if_not_exists();
    sale_table.if_not_exists();

    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&sale_table)).await?;
    db.execute_unprepared(CREATE_PRODUCT_NAME_INDEX).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        product::Model as ProductModel, sale::Model as SaleModel, user::Model as UserModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<SaleModel> = Sale::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_get_database_url_prefers_configured_over_default() {
        if std::env::var("DATABASE_URL").is_ok() {
            return;
        }
        assert_eq!(get_database_url(Some("sqlite::memory:")), "sqlite::memory:");
        assert_eq!(get_database_url(None), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path("sqlite://data/stockroom.sqlite?mode=rwc"),
            Some(Path::new("data/stockroom.sqlite"))
        );
        assert_eq!(sqlite_file_path("sqlite:shop.db"), Some(Path::new("shop.db")));
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/shop"), None);
    }

    #[tokio::test]
    async fn test_create_connection_makes_parent_dir() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("stockroom-db-{}", std::process::id()));
        let url = format!("sqlite://{}/nested/shop.sqlite?mode=rwc", dir.display());

        let db = create_connection(&url).await?;
        create_tables(&db).await?;
        drop(db);

        assert!(dir.join("nested").is_dir());
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
