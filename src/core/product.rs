//! Catalog repository - Handles all product-related operations.
//!
//! Products are created, edited and deleted here; checkout decrements stock
//! through [`adjust_stock`]. Name uniqueness is case-insensitive and enforced
//! by the store, so a conflicting insert or update surfaces as
//! [`Error::DuplicateProductName`] without a read-then-write race.
//!
//! Deleting a product also deletes its sale lines, inside a single unit of
//! work, so a product referenced by history is never orphaned.

use crate::{
    entities::{Product, Sale, product, sale},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Input for inserting or editing a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    /// Must be `None` on insert and `Some` on update
    pub id: Option<i64>,
    /// Display name
    pub name: String,
    /// Unit price, finite and non-negative
    pub price: f64,
    /// Stock on hand, non-negative
    pub quantity: i32,
}

impl ProductDraft {
    /// A draft for a new product.
    pub fn new(name: impl Into<String>, price: f64, quantity: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            quantity,
        }
    }

    /// A draft that edits the product with `id`.
    pub fn existing(id: i64, name: impl Into<String>, price: f64, quantity: i32) -> Self {
        Self {
            id: Some(id),
            ..Self::new(name, price, quantity)
        }
    }
}

impl From<product::Model> for ProductDraft {
    fn from(model: product::Model) -> Self {
        Self::existing(model.id, model.name, model.price, model.quantity)
    }
}

/// Rows removed by [`delete_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeDeletion {
    /// Sale lines that referenced the product
    pub sales_removed: u64,
    /// Product rows (always 1 on success)
    pub products_removed: u64,
}

impl CascadeDeletion {
    /// Total rows removed.
    #[must_use]
    pub const fn rows_removed(&self) -> u64 {
        self.sales_removed + self.products_removed
    }
}

/// Retrieves every product ordered by id.
pub async fn list_products<C: ConnectionTrait>(db: &C) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by exact, case-sensitive name.
pub async fn get_product_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product and returns it with its store-assigned id.
///
/// # Errors
/// Returns an error if:
/// - The draft carries an id
/// - The name is empty or whitespace-only
/// - The price is negative or not finite
/// - The quantity is negative
/// - Another product already has this name, ignoring case
/// - The database insert operation fails
#[instrument(skip(db))]
pub async fn create_product(
    db: &DatabaseConnection,
    draft: ProductDraft,
) -> Result<product::Model> {
    if draft.id.is_some() {
        return Err(Error::validation("A new product must not carry an id"));
    }
    let name = validate_draft(&draft)?;

    let product = product::ActiveModel {
        name: Set(name.clone()),
        price: Set(draft.price),
        quantity: Set(draft.quantity),
        ..Default::default()
    };
    let created = product
        .insert(db)
        .await
        .map_err(|e| classify_write_error(e, &name))?;

    info!(product_id = created.id, "Created product '{}'", created.name);
    Ok(created)
}

/// Overwrites name, price and quantity of an existing product.
///
/// # Errors
/// Returns an error if:
/// - The draft has no id
/// - Any field fails the same validation as [`create_product`]
/// - No product has this id
/// - Another product already has the new name, ignoring case
/// - The database update operation fails
#[instrument(skip(db))]
pub async fn update_product(
    db: &DatabaseConnection,
    draft: ProductDraft,
) -> Result<product::Model> {
    let product_id = draft
        .id
        .ok_or_else(|| Error::validation("Product id is required for update"))?;
    let name = validate_draft(&draft)?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.name = Set(name.clone());
    product.price = Set(draft.price);
    product.quantity = Set(draft.quantity);

    let updated = product
        .update(db)
        .await
        .map_err(|e| classify_write_error(e, &name))?;

    debug!(product_id, "Updated product");
    Ok(updated)
}

/// Deletes a product together with every sale line that references it.
///
/// Both deletes run in one transaction; if either fails, or the product does
/// not exist, nothing is removed. Collaborators caching totals should refresh
/// after a successful delete.
///
/// # Errors
/// Returns `Error::ProductNotFound` for an unknown id, or a database error.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<CascadeDeletion> {
    let txn = db.begin().await?;

    let sales_removed = Sale::delete_many()
        .filter(sale::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?
        .rows_affected;

    let products_removed = Product::delete_by_id(product_id)
        .exec(&txn)
        .await?
        .rows_affected;

    if products_removed == 0 {
        // Dropping `txn` rolls back.
        return Err(Error::ProductNotFound { id: product_id });
    }

    txn.commit().await?;

    info!(
        product_id,
        sales_removed, "Deleted product and its sale history"
    );
    Ok(CascadeDeletion {
        sales_removed,
        products_removed,
    })
}

/// Changes stock on hand by `delta` and returns the updated product.
///
/// Runs on whatever connection it is given, so checkout can call it inside
/// its own transaction.
///
/// # Errors
/// Returns `Error::InsufficientStock` if stock would drop below zero,
/// `Error::Validation` if it would exceed `i32::MAX`, or a database error.
pub async fn adjust_stock<C: ConnectionTrait>(
    db: &C,
    product: product::Model,
    delta: i32,
) -> Result<product::Model> {
    let new_quantity = product.quantity.checked_add(delta).ok_or_else(|| {
        Error::validation(format!(
            "Stock of '{}' cannot grow by {delta} from {}",
            product.name, product.quantity
        ))
    })?;
    if new_quantity < 0 {
        return Err(Error::InsufficientStock {
            product: product.name,
            available: product.quantity,
            requested: delta.saturating_neg(),
        });
    }

    let mut active: product::ActiveModel = product.into();
    active.quantity = Set(new_quantity);
    active.update(db).await.map_err(Into::into)
}

/// Validates a draft and returns the trimmed name.
fn validate_draft(draft: &ProductDraft) -> Result<String> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    if !draft.price.is_finite() || draft.price < 0.0 {
        return Err(Error::validation(format!(
            "Product price must be a non-negative number, got {}",
            draft.price
        )));
    }
    if draft.quantity < 0 {
        return Err(Error::validation(format!(
            "Product quantity cannot be negative, got {}",
            draft.quantity
        )));
    }
    Ok(name.to_string())
}

fn classify_write_error(err: DbErr, name: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateProductName {
            name: name.to_string(),
        },
        _ => err.into(),
    }
}
