//! Wallet business logic - JestCoin balances and their ledger.
//!
//! Every balance change goes through [`apply_entry`], which writes the balance update and
//! the matching ledger row on the same connection. Callers run it inside a database
//! transaction, so a wallet's ledger rows always sum to its balance. Debits use a
//! single conditional `UPDATE ... WHERE balance >= amount`, which is what keeps concurrent
//! spenders from overdrawing a wallet.

use crate::{
    config::database::retry_on_busy,
    entities::{Transaction, TransactionKind, Wallet, transaction, wallet},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, info};

/// A balance change to post to a wallet.
///
/// `amount` is the magnitude in minor units; the sign of the ledger row comes from `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Ledger kind; decides credit or debit
    pub kind: TransactionKind,
    /// Magnitude in minor units, must be positive
    pub amount: i64,
    /// Counterparty or source, e.g. the other member of a transfer
    pub reference: Option<String>,
    /// Free-form note shown in the history
    pub description: Option<String>,
    /// Unique key; an entry with a used key is not applied twice
    pub idempotency_key: Option<String>,
}

impl NewEntry {
    /// Entry of `amount` minor units with no reference, description or key.
    #[must_use]
    pub const fn new(kind: TransactionKind, amount: i64) -> Self {
        Self {
            kind,
            amount,
            reference: None,
            description: None,
            idempotency_key: None,
        }
    }

    /// Sets the reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }

    /// Signed amount as stored in the ledger.
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        if self.kind.is_credit() {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// Finds a user's wallet without creating one.
pub async fn get_wallet<C>(db: &C, user_id: &str) -> Result<Option<wallet::Model>>
where
    C: ConnectionTrait,
{
    Wallet::find()
        .filter(wallet::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user's wallet, creating an empty one on first access.
///
/// The insert is `ON CONFLICT (user_id) DO NOTHING`, so two first accesses racing each
/// other both end up reading the same single row.
pub async fn get_or_create_wallet<C>(db: &C, user_id: &str) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_wallet(db, user_id).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let new_wallet = wallet::ActiveModel {
        user_id: Set(user_id.to_string()),
        balance: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = Wallet::insert(new_wallet)
        .on_conflict(
            OnConflict::column(wallet::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    if inserted > 0 {
        info!(user_id, "Created wallet");
    }

    get_wallet(db, user_id)
        .await?
        .ok_or_else(|| Error::WalletNotFound {
            user_id: user_id.to_string(),
        })
}

/// Looks up a ledger row by its idempotency key.
pub async fn find_entry_by_key<C>(db: &C, key: &str) -> Result<Option<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::IdempotencyKey.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Applies one entry to `wallet`: updates the balance and appends the ledger row.
///
/// Must run inside a database transaction together with whatever else the caller
/// writes. Debits that would make the balance negative fail with
/// [`Error::InsufficientFunds`] without touching anything.
pub async fn apply_entry<C>(
    db: &C,
    wallet: &wallet::Model,
    entry: NewEntry,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    if entry.amount <= 0 {
        return Err(Error::InvalidAmount {
            amount: entry.amount,
        });
    }

    let now = Utc::now();
    let update = if entry.kind.is_credit() {
        Wallet::update_many()
            .col_expr(
                wallet::Column::Balance,
                Expr::col(wallet::Column::Balance).add(entry.amount),
            )
            .col_expr(wallet::Column::UpdatedAt, Expr::value(now))
            .filter(wallet::Column::Id.eq(wallet.id))
            .exec(db)
            .await?
    } else {
        // Guarded decrement: matches no row when the balance is too low
        Wallet::update_many()
            .col_expr(
                wallet::Column::Balance,
                Expr::col(wallet::Column::Balance).sub(entry.amount),
            )
            .col_expr(wallet::Column::UpdatedAt, Expr::value(now))
            .filter(wallet::Column::Id.eq(wallet.id))
            .filter(wallet::Column::Balance.gte(entry.amount))
            .exec(db)
            .await?
    };

    if update.rows_affected == 0 {
        let current = Wallet::find_by_id(wallet.id)
            .one(db)
            .await?
            .ok_or_else(|| Error::WalletNotFound {
                user_id: wallet.user_id.clone(),
            })?
            .balance;
        return Err(Error::InsufficientFunds {
            current,
            required: entry.amount,
        });
    }

    let signed_amount = entry.signed_amount();
    let row = transaction::ActiveModel {
        wallet_id: Set(wallet.id),
        amount: Set(signed_amount),
        kind: Set(entry.kind),
        reference: Set(entry.reference),
        description: Set(entry.description),
        idempotency_key: Set(entry.idempotency_key),
        created_at: Set(now),
        ..Default::default()
    };
    let row = row.insert(db).await?;

    debug!(
        wallet_id = wallet.id,
        amount = signed_amount,
        kind = entry.kind.as_str(),
        "Posted ledger entry"
    );
    Ok(row)
}

/// Credits a user's wallet, creating the wallet if needed.
///
/// Returns the updated wallet and the new ledger row. When the entry carries an
/// idempotency key that was already used, the earlier row is returned unchanged.
pub async fn credit(
    db: &DatabaseConnection,
    user_id: &str,
    entry: NewEntry,
) -> Result<(wallet::Model, transaction::Model)> {
    if !entry.kind.is_credit() {
        return Err(Error::validation(format!(
            "{} is not a credit",
            entry.kind.as_str()
        )));
    }

    retry_on_busy(move || credit_once(db, user_id, entry.clone())).await
}

async fn credit_once(
    db: &DatabaseConnection,
    user_id: &str,
    entry: NewEntry,
) -> Result<(wallet::Model, transaction::Model)> {
    let txn = db.begin().await?;
    let wallet = get_or_create_wallet(&txn, user_id).await?;
    let row = post_once(&txn, &wallet, entry).await?;
    let wallet = refresh_wallet(&txn, &wallet).await?;
    txn.commit().await?;

    Ok((wallet, row))
}

/// Debits a user's wallet. The wallet must already exist.
pub async fn debit(
    db: &DatabaseConnection,
    user_id: &str,
    entry: NewEntry,
) -> Result<(wallet::Model, transaction::Model)> {
    if entry.kind.is_credit() {
        return Err(Error::validation(format!(
            "{} is not a debit",
            entry.kind.as_str()
        )));
    }

    retry_on_busy(move || debit_once(db, user_id, entry.clone())).await
}

async fn debit_once(
    db: &DatabaseConnection,
    user_id: &str,
    entry: NewEntry,
) -> Result<(wallet::Model, transaction::Model)> {
    let txn = db.begin().await?;
    let wallet = get_wallet(&txn, user_id)
        .await?
        .ok_or_else(|| Error::WalletNotFound {
            user_id: user_id.to_string(),
        })?;
    let row = post_once(&txn, &wallet, entry).await?;
    let wallet = refresh_wallet(&txn, &wallet).await?;
    txn.commit().await?;

    Ok((wallet, row))
}

async fn post_once<C>(
    db: &C,
    wallet: &wallet::Model,
    entry: NewEntry,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    if let Some(key) = entry.idempotency_key.as_deref() {
        if let Some(existing) = find_entry_by_key(db, key).await? {
            debug!(key, "Replaying ledger entry for reused idempotency key");
            return Ok(existing);
        }
    }
    apply_entry(db, wallet, entry).await
}

/// Re-reads a wallet after its balance changed.
pub async fn refresh_wallet<C>(db: &C, wallet: &wallet::Model) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    Wallet::find_by_id(wallet.id)
        .one(db)
        .await?
        .ok_or_else(|| Error::WalletNotFound {
            user_id: wallet.user_id.clone(),
        })
}

/// Retrieves the newest ledger rows of a user's wallet, newest first.
///
/// A user without a wallet simply has no history.
pub async fn get_transaction_history(
    db: &DatabaseConnection,
    user_id: &str,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    let Some(wallet) = get_wallet(db, user_id).await? else {
        return Ok(Vec::new());
    };

    Transaction::find()
        .filter(transaction::Column::WalletId.eq(wallet.id))
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of all ledger amounts of a wallet.
///
/// Equal to the wallet's balance at all times; exposed for reconciliation.
pub async fn ledger_balance<C>(db: &C, wallet_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<i64>> = Transaction::find()
        .select_only()
        .column_as(transaction::Column::Amount.sum(), "total")
        .filter(transaction::Column::WalletId.eq(wallet_id))
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_get_or_create_wallet_creates_empty_wallet() -> Result<()> {
        let db = setup_test_db().await?;

        let wallet = get_or_create_wallet(&db, "user_a").await?;
        assert_eq!(wallet.user_id, "user_a");
        assert_eq!(wallet.balance, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_create_wallet_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;

        let first = get_or_create_wallet(&db, "user_a").await?;
        let second = get_or_create_wallet(&db, "user_a").await?;
        assert_eq!(first.id, second.id);

        let count = Wallet::find()
            .filter(wallet::Column::UserId.eq("user_a"))
            .count(&db)
            .await?;
        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_first_access_creates_one_wallet() -> Result<()> {
        let db = setup_test_db().await?;

        let (a, b) = tokio::join!(
            get_or_create_wallet(&db, "user_a"),
            get_or_create_wallet(&db, "user_a")
        );
        assert_eq!(a?.id, b?.id);

        let count = Wallet::find().count(&db).await?;
        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_wallet_does_not_create() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(get_wallet(&db, "nobody").await?.is_none());
        assert_eq!(Wallet::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_updates_balance_and_ledger() -> Result<()> {
        let db = setup_test_db().await?;

        let (wallet, row) = credit(
            &db,
            "user_a",
            NewEntry::new(TransactionKind::Deposit, 5_000)
                .with_description(Some("Welcome bonus".to_string())),
        )
        .await?;

        assert_eq!(wallet.balance, 5_000);
        assert_eq!(row.amount, 5_000);
        assert_eq!(row.kind, TransactionKind::Deposit);
        assert_eq!(row.description.as_deref(), Some("Welcome bonus"));
        assert_eq!(ledger_balance(&db, wallet.id).await?, wallet.balance);

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_records_negative_amount() -> Result<()> {
        let db = setup_test_db().await?;
        fund_wallet(&db, "user_a", 10_000).await?;

        let (wallet, row) = debit(
            &db,
            "user_a",
            NewEntry::new(TransactionKind::Withdrawal, 2_500),
        )
        .await?;

        assert_eq!(wallet.balance, 7_500);
        assert_eq!(row.amount, -2_500);
        assert_eq!(ledger_balance(&db, wallet.id).await?, 7_500);

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_insufficient_funds_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let wallet = fund_wallet(&db, "user_a", 1_000).await?;

        let result = debit(
            &db,
            "user_a",
            NewEntry::new(TransactionKind::Withdrawal, 4_000),
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::InsufficientFunds {
                current: 1_000,
                required: 4_000
            })
        ));

        let wallet = refresh_wallet(&db, &wallet).await?;
        assert_eq!(wallet.balance, 1_000);
        assert_eq!(Transaction::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_without_wallet() -> Result<()> {
        let db = setup_test_db().await?;

        let result = debit(&db, "ghost", NewEntry::new(TransactionKind::Withdrawal, 100)).await;
        assert!(matches!(result, Err(Error::WalletNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_with_reused_key_is_applied_once() -> Result<()> {
        let db = setup_test_db().await?;
        let entry = NewEntry::new(TransactionKind::Deposit, 700)
            .with_idempotency_key(Some("grant-42".to_string()));

        let (_, first) = credit(&db, "user_a", entry.clone()).await?;
        let (wallet, second) = credit(&db, "user_a", entry).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(wallet.balance, 700);

        Ok(())
    }

    #[tokio::test]
    async fn test_kind_direction_is_validated() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = credit(&db, "user_a", NewEntry::new(TransactionKind::Purchase, 100)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = debit(&db, "user_a", NewEntry::new(TransactionKind::Reward, 100)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() -> Result<()> {
        let db = setup_test_db().await?;

        let result = credit(&db, "user_a", NewEntry::new(TransactionKind::Deposit, 0)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0 })));

        let result = credit(&db, "user_a", NewEntry::new(TransactionKind::Deposit, -5)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -5 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_limited() -> Result<()> {
        let db = setup_test_db().await?;
        for amount in [100, 200, 300] {
            credit(&db, "user_a", NewEntry::new(TransactionKind::Deposit, amount)).await?;
        }

        let history = get_transaction_history(&db, "user_a", 2).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, 300);
        assert_eq!(history[1].amount, 200);

        assert!(get_transaction_history(&db, "nobody", 10).await?.is_empty());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_debits_on_shared_database() -> Result<()> {
        let shared = setup_file_test_db().await?;
        let db = &shared.db;

        for _ in 0..10 {
            fund_wallet(db, "user_a", 100).await?;
            let spend = || {
                let db = share_pool(db);
                tokio::spawn(async move {
                    debit(&db, "user_a", NewEntry::new(TransactionKind::Purchase, 100)).await
                })
            };
            let (first, second) = tokio::join!(spend(), spend());
            let results = [first.unwrap(), second.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results.iter().any(|r| matches!(
                r,
                Err(Error::InsufficientFunds {
                    current: 0,
                    required: 100
                })
            )));
        }

        let wallet = get_wallet(db, "user_a").await?.unwrap();
        assert_eq!(wallet.balance, 0);
        assert_eq!(ledger_balance(db, wallet.id).await?, 0);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_first_access_on_shared_database() -> Result<()> {
        let shared = setup_file_test_db().await?;

        for round in 0..10 {
            let user = format!("user_{round}");
            let open = || {
                let db = share_pool(&shared.db);
                let user = user.clone();
                tokio::spawn(async move { get_or_create_wallet(&db, &user).await })
            };
            let (first, second) = tokio::join!(open(), open());
            assert_eq!(first.unwrap()?.id, second.unwrap()?.id);
        }
        assert_eq!(Wallet::find().count(&shared.db).await?, 10);

        Ok(())
    }
}
