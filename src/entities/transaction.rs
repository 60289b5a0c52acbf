//! Transaction entity - Immutable JestCoin ledger entries.
//!
//! Each entry belongs to one wallet and carries a signed `amount` (positive for credits,
//! negative for debits). Entries are written in the same database transaction as the
//! balance change they describe, so the entries of a wallet always sum to its balance.
//! `idempotency_key` is unique; it deduplicates retried transfers, checkouts and the
//! once-per-day reward.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of ledger entry
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "transfer_in")]
    TransferIn,
    #[sea_orm(string_value = "transfer_out")]
    TransferOut,
    #[sea_orm(string_value = "purchase")]
    Purchase,
    #[sea_orm(string_value = "reward")]
    Reward,
    #[sea_orm(string_value = "airdrop")]
    Airdrop,
}

impl TransactionKind {
    /// Whether entries of this kind add to the balance.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(
            self,
            Self::Deposit | Self::TransferIn | Self::Reward | Self::Airdrop
        )
    }

    /// Tag used when rendering the ledger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
            Self::Purchase => "purchase",
            Self::Reward => "reward",
            Self::Airdrop => "airdrop",
        }
    }
}

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the wallet this entry belongs to
    #[sea_orm(indexed)]
    pub wallet_id: i64,
    /// Signed amount in minor units
    pub amount: i64,
    /// Type tag of the entry
    pub kind: TransactionKind,
    /// Counterparty user or source entity (e.g. `order:12`)
    pub reference: Option<String>,
    /// Human-readable description
    pub description: Option<String>,
    /// Deduplication key for retried operations
    #[sea_orm(unique)]
    pub idempotency_key: Option<String>,
    /// When the entry was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one wallet
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::WalletId",
        to = "super::wallet::Column::Id"
    )]
    Wallet,
}

impl Related<super::wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
