//! Wallet entity - One JestCoin balance per user.
//!
//! Balances are stored in minor units (1 JestCoin = 100). A wallet is created lazily the
//! first time its owner touches the wallet and is never deleted. The unique constraint on
//! `user_id` is what makes get-or-create safe under concurrent first access.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the wallet, at most one wallet per user
    #[sea_orm(unique)]
    pub user_id: String,
    /// Current balance in minor units, never negative
    pub balance: i64,
    /// When the wallet was created
    pub created_at: DateTimeUtc,
    /// When the balance last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Wallet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One wallet has many ledger entries
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
