//! JestCoin transfers between users.
//!
//! A transfer checks its preconditions in a fixed order and then performs four writes:
//! sender decrement, recipient increment, debit row, credit row. All of them run in one
//! database transaction. If any step fails, none of them is applied, so there is no
//! partially applied transfer to compensate. The sender decrement is the guarded
//! single-statement update from [`wallet::apply_entry`], which also makes two
//! simultaneous transfers from the same wallet unable to overdraw it.

use crate::{
    config::database::retry_on_busy,
    core::{
        activity, profile, report,
        wallet::{self, NewEntry},
    },
    entities::{TransactionKind, transaction},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

/// A transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Member paying
    pub sender_id: String,
    /// Member receiving; must have a profile
    pub recipient_id: String,
    /// Amount in minor units, must be positive
    pub amount: i64,
    /// Note stored on both ledger rows
    pub description: Option<String>,
    /// Caller-chosen key; resubmitting a request with the same key is a no-op
    pub idempotency_key: Option<String>,
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// Negative `transfer_out` row on the sender's wallet
    pub debit: transaction::Model,
    /// Positive `transfer_in` row on the recipient's wallet
    pub credit: transaction::Model,
    /// Sender's balance after the transfer
    pub sender_balance: i64,
    /// Recipient's balance after the transfer
    pub recipient_balance: i64,
    /// True when the request was a replay of an already completed transfer
    pub replayed: bool,
}

fn debit_key(key: &str) -> String {
    format!("transfer:{key}:out")
}

fn credit_key(key: &str) -> String {
    format!("transfer:{key}:in")
}

/// Moves `request.amount` from the sender's wallet to the recipient's wallet.
///
/// Preconditions, checked in order before anything is written:
/// 1. the amount is positive and the two parties differ,
/// 2. the recipient has a profile,
/// 3. the sender has a wallet holding at least the amount,
/// 4. the recipient has a wallet (created on demand, as the wallet reader does).
#[instrument(skip(db, request), fields(sender = %request.sender_id, recipient = %request.recipient_id, amount = request.amount))]
pub async fn transfer(db: &DatabaseConnection, request: TransferRequest) -> Result<TransferReceipt> {
    if request.amount <= 0 {
        return Err(Error::InvalidAmount {
            amount: request.amount,
        });
    }
    if request.sender_id == request.recipient_id {
        return Err(Error::SelfTransfer);
    }

    let request = &request;
    retry_on_busy(move || transfer_once(db, request)).await
}

async fn transfer_once(db: &DatabaseConnection, request: &TransferRequest) -> Result<TransferReceipt> {
    let txn = db.begin().await?;

    if let Some(key) = request.idempotency_key.as_deref() {
        if let Some(receipt) = replay(&txn, request, key).await? {
            info!("Transfer already applied, returning original receipt");
            return Ok(receipt);
        }
    }

    if profile::get_profile_by_user_id(&txn, &request.recipient_id)
        .await?
        .is_none()
    {
        return Err(Error::ProfileNotFound {
            user_id: request.recipient_id.clone(),
        });
    }

    let sender_wallet = wallet::get_wallet(&txn, &request.sender_id)
        .await?
        .ok_or_else(|| Error::WalletNotFound {
            user_id: request.sender_id.clone(),
        })?;
    if sender_wallet.balance < request.amount {
        warn!(
            balance = sender_wallet.balance,
            "Transfer rejected for insufficient funds"
        );
        return Err(Error::InsufficientFunds {
            current: sender_wallet.balance,
            required: request.amount,
        });
    }

    let recipient_wallet = wallet::get_or_create_wallet(&txn, &request.recipient_id).await?;

    let debit = wallet::apply_entry(
        &txn,
        &sender_wallet,
        NewEntry::new(TransactionKind::TransferOut, request.amount)
            .with_reference(request.recipient_id.clone())
            .with_description(request.description.clone())
            .with_idempotency_key(request.idempotency_key.as_deref().map(debit_key)),
    )
    .await
    .inspect_err(|e| warn!("Transfer rolled back at sender debit: {e}"))?;

    let credit = wallet::apply_entry(
        &txn,
        &recipient_wallet,
        NewEntry::new(TransactionKind::TransferIn, request.amount)
            .with_reference(request.sender_id.clone())
            .with_description(request.description.clone())
            .with_idempotency_key(request.idempotency_key.as_deref().map(credit_key)),
    )
    .await
    .inspect_err(|e| warn!("Transfer rolled back at recipient credit: {e}"))?;

    activity::log_activity(
        &txn,
        &request.sender_id,
        "wallet.transfer",
        Some(format!(
            "{} to {}",
            report::format_coins(request.amount),
            request.recipient_id
        )),
    )
    .await?;

    let sender_balance = wallet::refresh_wallet(&txn, &sender_wallet).await?.balance;
    let recipient_balance = wallet::refresh_wallet(&txn, &recipient_wallet)
        .await?
        .balance;

    txn.commit().await?;
    info!(sender_balance, recipient_balance, "Transfer completed");

    Ok(TransferReceipt {
        debit,
        credit,
        sender_balance,
        recipient_balance,
        replayed: false,
    })
}

async fn replay<C>(db: &C, request: &TransferRequest, key: &str) -> Result<Option<TransferReceipt>>
where
    C: ConnectionTrait,
{
    let Some(debit) = wallet::find_entry_by_key(db, &debit_key(key)).await? else {
        return Ok(None);
    };
    let Some(credit) = wallet::find_entry_by_key(db, &credit_key(key)).await? else {
        return Ok(None);
    };

    let sender_balance = wallet::get_wallet(db, &request.sender_id)
        .await?
        .map_or(0, |w| w.balance);
    let recipient_balance = wallet::get_wallet(db, &request.recipient_id)
        .await?
        .map_or(0, |w| w.balance);

    Ok(Some(TransferReceipt {
        debit,
        credit,
        sender_balance,
        recipient_balance,
        replayed: true,
    }))
}
