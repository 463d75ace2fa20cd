//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the `products`, `users` and `sales` tables and
//! their relationships.

pub mod product;
pub mod sale;
pub mod user;

// Re-export specific types to avoid conflicts
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
