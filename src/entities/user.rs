//! User entity - An account allowed to log in and record sales.
//!
//! Only the bcrypt hash of the password is stored. Listings go through
//! [`crate::core::user::UserSummary`] so the hash is never loaded in bulk.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access level of an account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May manage users in addition to selling
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// May sell and manage the catalog
    #[sea_orm(string_value = "EMPLOYEE")]
    Employee,
}

impl Role {
    /// Whether this role grants user management.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique
    #[sea_orm(unique)]
    pub username: String,
    /// Salted bcrypt hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Access level
    pub role: Role,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user records many sale lines
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
