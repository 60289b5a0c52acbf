//! Admin business logic - Dashboard statistics and manual JestCoin adjustments.
//!
//! Permission checks happen in the bot layer; these functions assume the caller is an
//! admin and record the admin's ID in the activity log.

use crate::{
    config::database::retry_on_busy,
    core::{
        activity, booking, community, profile, report, store,
        wallet::{self, NewEntry},
    },
    entities::{BookingStatus, Profile, Transaction, TransactionKind, Wallet, wallet as wallet_entity},
    errors::{Error, Result},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QuerySelect, TransactionTrait,
};
use tracing::{info, instrument};

/// Aggregate numbers shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    /// Registered members
    pub profiles: u64,
    /// Wallets created so far
    pub wallets: u64,
    /// Sum of all wallet balances, in minor units
    pub coins_in_circulation: i64,
    /// Rows in the ledger
    pub ledger_entries: u64,
    /// Booking count per status, in status order
    pub bookings_by_status: Vec<(BookingStatus, u64)>,
    /// Completed checkouts
    pub orders: u64,
    /// Sum of all order totals, in minor units
    pub revenue: i64,
    /// Community posts
    pub posts: u64,
}

/// Collects the dashboard numbers.
pub async fn dashboard_stats(db: &DatabaseConnection) -> Result<DashboardStats> {
    let circulation: Option<Option<i64>> = Wallet::find()
        .select_only()
        .column_as(wallet_entity::Column::Balance.sum(), "circulation")
        .into_tuple()
        .one(db)
        .await?;
    let (orders, revenue) = store::sales_summary(db).await?;

    Ok(DashboardStats {
        profiles: profile::count_profiles(db).await?,
        wallets: Wallet::find().count(db).await?,
        coins_in_circulation: circulation.flatten().unwrap_or(0),
        ledger_entries: Transaction::find().count(db).await?,
        bookings_by_status: booking::count_by_status(db).await?,
        orders,
        revenue,
        posts: community::count_posts(db).await?,
    })
}

/// Credits `amount` to the wallet of every profile in one transaction.
///
/// Returns the number of wallets credited.
#[instrument(skip(db))]
pub async fn airdrop(
    db: &DatabaseConnection,
    admin_id: &str,
    amount: i64,
    description: Option<String>,
) -> Result<u64> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let recipients = retry_on_busy(|| airdrop_once(db, admin_id, amount, description.clone())).await?;
    info!(recipients, amount, "Airdrop completed");
    Ok(recipients)
}

async fn airdrop_once(
    db: &DatabaseConnection,
    admin_id: &str,
    amount: i64,
    description: Option<String>,
) -> Result<u64> {
    let txn = db.begin().await?;
    let profiles = Profile::find().all(&txn).await?;

    for member in &profiles {
        let wallet = wallet::get_or_create_wallet(&txn, &member.user_id).await?;
        let entry = NewEntry::new(TransactionKind::Airdrop, amount)
            .with_reference(admin_id)
            .with_description(description.clone());
        wallet::apply_entry(&txn, &wallet, entry).await?;
    }

    let recipients = u64::try_from(profiles.len())?;
    activity::log_activity(
        &txn,
        admin_id,
        "admin.airdrop",
        Some(format!(
            "{} to {recipients} members",
            report::format_coins(amount)
        )),
    )
    .await?;

    txn.commit().await?;
    Ok(recipients)
}

/// Adds JestCoins to a member's wallet as a `deposit`. Returns the new balance.
pub async fn grant(
    db: &DatabaseConnection,
    admin_id: &str,
    user_id: &str,
    amount: i64,
    description: Option<String>,
) -> Result<i64> {
    if profile::get_profile_by_user_id(db, user_id).await?.is_none() {
        return Err(Error::ProfileNotFound {
            user_id: user_id.to_string(),
        });
    }

    let entry = NewEntry::new(TransactionKind::Deposit, amount)
        .with_reference(admin_id)
        .with_description(description);
    let balance = retry_on_busy(|| adjust_once(db, admin_id, user_id, entry.clone())).await?;
    info!(admin_id, user_id, amount, "Granted JestCoins");
    Ok(balance)
}

/// Removes JestCoins from a member's wallet as a `withdrawal`. Returns the new balance.
pub async fn deduct(
    db: &DatabaseConnection,
    admin_id: &str,
    user_id: &str,
    amount: i64,
    description: Option<String>,
) -> Result<i64> {
    let entry = NewEntry::new(TransactionKind::Withdrawal, amount)
        .with_reference(admin_id)
        .with_description(description);
    let balance = retry_on_busy(|| adjust_once(db, admin_id, user_id, entry.clone())).await?;
    info!(admin_id, user_id, amount, "Deducted JestCoins");
    Ok(balance)
}

/// Posts a manual adjustment and its activity row in one transaction.
async fn adjust_once(
    db: &DatabaseConnection,
    admin_id: &str,
    user_id: &str,
    entry: NewEntry,
) -> Result<i64> {
    let txn = db.begin().await?;
    let (wallet, action, details) = if entry.kind.is_credit() {
        (
            wallet::get_or_create_wallet(&txn, user_id).await?,
            "admin.grant",
            format!("{} to {user_id}", report::format_coins(entry.amount)),
        )
    } else {
        let wallet = wallet::get_wallet(&txn, user_id)
            .await?
            .ok_or_else(|| Error::WalletNotFound {
                user_id: user_id.to_string(),
            })?;
        (
            wallet,
            "admin.deduct",
            format!("{} from {user_id}", report::format_coins(entry.amount)),
        )
    };

    wallet::apply_entry(&txn, &wallet, entry).await?;
    activity::log_activity(&txn, admin_id, action, Some(details)).await?;
    let balance = wallet::refresh_wallet(&txn, &wallet).await?.balance;
    txn.commit().await?;
    Ok(balance)
}
