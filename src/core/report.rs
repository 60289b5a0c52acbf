//! Wallet report and amount formatting.
//!
//! This module turns raw ledger data into structured reports and display strings, and
//! parses user-entered amounts into minor units. All functions are framework-agnostic;
//! the bot layer decides how to lay them out.

use crate::{
    config::COIN,
    core::wallet,
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, QuerySelect, prelude::*};

/// Largest amount a single command may move, in whole JestCoins.
pub const MAX_COINS_PER_OPERATION: f64 = 1_000_000.0;

/// Balance overview for one user.
#[derive(Debug, Clone)]
pub struct WalletReport {
    /// Current balance in minor units
    pub balance: i64,
    /// Sum of all credits ever received
    pub total_received: i64,
    /// Sum of all debits ever made, as a positive number
    pub total_spent: i64,
    /// Recent ledger rows, newest first
    pub recent_transactions: Vec<transaction::Model>,
}

/// Generates a wallet report, creating the wallet if it does not exist yet.
///
/// # Arguments
/// * `db` - Database connection
/// * `user_id` - Wallet owner
/// * `transaction_limit` - Maximum number of recent rows to include
pub async fn generate_wallet_report(
    db: &DatabaseConnection,
    user_id: &str,
    transaction_limit: u64,
) -> Result<WalletReport> {
    let wallet = wallet::get_or_create_wallet(db, user_id).await?;
    let recent_transactions =
        wallet::get_transaction_history(db, user_id, transaction_limit).await?;

    let total_received = sum_amounts(db, wallet.id, transaction::Column::Amount.gt(0)).await?;
    let total_spent = -sum_amounts(db, wallet.id, transaction::Column::Amount.lt(0)).await?;

    Ok(WalletReport {
        balance: wallet.balance,
        total_received,
        total_spent,
        recent_transactions,
    })
}

/// Sum of a wallet's ledger amounts matching `sign`.
async fn sum_amounts(
    db: &DatabaseConnection,
    wallet_id: i64,
    sign: sea_orm::sea_query::SimpleExpr,
) -> Result<i64> {
    let total: Option<Option<i64>> = Transaction::find()
        .select_only()
        .column_as(transaction::Column::Amount.sum(), "total")
        .filter(transaction::Column::WalletId.eq(wallet_id))
        .filter(sign)
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0))
}

/// Converts a user-entered JestCoin amount into minor units.
///
/// Accepts at most two decimal places worth of precision (rounded to the nearest
/// minor unit) and rejects non-finite, non-positive or absurdly large values.
pub fn parse_coins(amount: f64) -> Result<i64> {
    if !amount.is_finite() {
        return Err(Error::validation("Invalid amount: must be a valid number"));
    }
    if amount <= 0.0 {
        return Err(Error::validation(
            "Invalid amount: must be greater than zero",
        ));
    }
    if amount > MAX_COINS_PER_OPERATION {
        return Err(Error::validation(format!(
            "Invalid amount: at most {MAX_COINS_PER_OPERATION:.0} JC per operation"
        )));
    }

    // Bounded above, so the cast cannot overflow
    #[allow(clippy::cast_possible_truncation)]
    let minor = (amount * 100.0).round() as i64;
    if minor == 0 {
        return Err(Error::validation("Invalid amount: smallest unit is 0.01 JC"));
    }
    Ok(minor)
}

/// Formats minor units as JestCoins, e.g. `12.50 JC`.
#[must_use]
pub fn format_coins(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let coin = COIN.unsigned_abs();
    format!("{sign}{}.{:02} JC", abs / coin, abs % coin)
}

/// Formats a ledger amount with an explicit sign, e.g. `+5.00 JC` or `-2.25 JC`.
#[must_use]
pub fn format_signed_coins(minor: i64) -> String {
    if minor >= 0 {
        format!("+{}", format_coins(minor))
    } else {
        format_coins(minor)
    }
}

/// Formats a price in cents, e.g. `$150.00`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Generates a summary line for a ledger row.
///
/// # Returns
/// Formatted summary string like `+10.00 JC | reward | Daily reward`
#[must_use]
pub fn format_transaction_summary(row: &transaction::Model) -> String {
    let amount_str = format_signed_coins(row.amount);
    let kind = row.kind.as_str();
    let desc = row.description.as_deref().unwrap_or("-");

    row.reference.as_ref().map_or_else(
        || format!("{amount_str} | {kind} | {desc}"),
        |reference| format!("{amount_str} | {kind} | {desc} ({reference})"),
    )
}
