//! Product entity - A sellable item with a price and stock on hand.
//!
//! Names are unique regardless of case; the store enforces this through the
//! `idx_products_name_nocase` index created alongside the table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Widget")
    pub name: String,
    /// Current unit price
    pub price: f64,
    /// Stock on hand
    pub quantity: i32,
}

impl Model {
    /// Value of the stock on hand at the current price.
    #[must_use]
    pub fn stock_value(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many sale lines
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
