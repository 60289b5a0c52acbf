//! Product entity - Items sold in the JESTFLY store.
//!
//! Prices are in JestCoin minor units. `stock` is `None` for unlimited items (digital
//! goods); otherwise it is decremented at checkout and never goes below zero.
//! Products are soft-deleted so past orders keep resolving.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Tour T-Shirt", "Backstage Pass")
    #[sea_orm(unique)]
    pub name: String,
    /// Optional catalogue description
    pub description: Option<String>,
    /// Price per unit in JestCoin minor units
    pub price: i64,
    /// Units left, `None` when unlimited
    pub stock: Option<i32>,
    /// Soft delete flag - if true, product is hidden but data is preserved
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product appears in many order lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
