//! Sale entity - One immutable line of a completed checkout.
//!
//! The unit price is captured when the sale is written and is never
//! re-derived from the product. Rows are only ever removed by the cascading
//! product delete.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product that was sold
    pub product_id: i64,
    /// User who recorded the sale
    pub user_id: i64,
    /// Units sold
    pub quantity: i32,
    /// Price per unit at the time of sale
    pub unit_price: f64,
    /// When the sale was written (UTC)
    pub sale_date: DateTimeUtc,
}

impl Model {
    /// Revenue of this line.
    #[must_use]
    pub fn revenue(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale line references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each sale line references the user who made it
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
