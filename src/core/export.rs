//! CSV export of the product catalog.

use crate::{core::product, entities::ProductModel, errors::Result};
use sea_orm::DatabaseConnection;
use std::{fs::File, io::Write, path::Path};
use tracing::{info, instrument};

const HEADER: [&str; 4] = ["ID", "Name", "Price", "Quantity"];

/// Writes `products` as CSV: a header row, then one row per product.
///
/// Prices are written with two decimals. Fields are quoted only when needed.
pub fn write_products_csv<W: Write>(writer: W, products: &[ProductModel]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for product in products {
        csv.write_record([
            product.id.to_string(),
            product.name.clone(),
            format!("{:.2}", product.price),
            product.quantity.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Snapshots the catalog into a CSV file at `path`, replacing it if present.
///
/// Returns the number of products written.
#[instrument(skip(db))]
pub async fn export_products_csv(db: &DatabaseConnection, path: &Path) -> Result<usize> {
    let products = product::list_products(db).await?;
    let file = File::create(path)?;
    write_products_csv(file, &products)?;
    info!(count = products.len(), "Exported catalog to {}", path.display());
    Ok(products.len())
}
