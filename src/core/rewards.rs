//! Daily JestCoin reward.
//!
//! A wallet may claim the reward once per UTC calendar day. The claim is recorded as a
//! `reward` ledger row whose idempotency key names the wallet and the day. The unique
//! constraint on that key is the guard, so two claims racing each other cannot both
//! credit the wallet. A claim that loses a lock conflict is restarted and then sees the
//! winner's row.

use crate::{
    config::database::retry_on_busy,
    core::{
        activity, report,
        wallet::{self, NewEntry},
    },
    entities::TransactionKind,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, SqlErr, TransactionTrait};
use tracing::{info, instrument};

/// Outcome of a successful claim.
#[derive(Debug, Clone)]
pub struct RewardClaim {
    /// Credited amount in minor units
    pub amount: i64,
    /// Wallet balance after the credit
    pub new_balance: i64,
    /// Calendar day the claim counts for
    pub date: NaiveDate,
}

/// Idempotency key marking the reward of `wallet_id` for `date`.
#[must_use]
pub fn daily_reward_key(wallet_id: i64, date: NaiveDate) -> String {
    format!("daily-reward:{wallet_id}:{}", date.format("%Y-%m-%d"))
}

/// Whether `user_id` has already claimed the reward for `date`.
pub async fn has_claimed(db: &DatabaseConnection, user_id: &str, date: NaiveDate) -> Result<bool> {
    let Some(wallet) = wallet::get_wallet(db, user_id).await? else {
        return Ok(false);
    };
    let key = daily_reward_key(wallet.id, date);
    Ok(wallet::find_entry_by_key(db, &key).await?.is_some())
}

/// Credits `amount` to the user's wallet unless the reward for `today` was already taken.
///
/// `today` is passed in so callers decide the calendar (the bot uses the UTC date).
#[instrument(skip(db))]
pub async fn claim_daily_reward(
    db: &DatabaseConnection,
    user_id: &str,
    amount: i64,
    today: NaiveDate,
) -> Result<RewardClaim> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    retry_on_busy(|| claim_once(db, user_id, amount, today)).await
}

async fn claim_once(
    db: &DatabaseConnection,
    user_id: &str,
    amount: i64,
    today: NaiveDate,
) -> Result<RewardClaim> {
    let txn = db.begin().await?;
    let wallet = wallet::get_or_create_wallet(&txn, user_id).await?;
    let key = daily_reward_key(wallet.id, today);

    if wallet::find_entry_by_key(&txn, &key).await?.is_some() {
        return Err(Error::RewardAlreadyClaimed { date: today });
    }

    let entry = NewEntry::new(TransactionKind::Reward, amount)
        .with_description(Some("Daily reward".to_string()))
        .with_idempotency_key(Some(key));

    match wallet::apply_entry(&txn, &wallet, entry).await {
        Ok(_) => {}
        Err(Error::Database(err))
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            // Lost the race against a concurrent claim for the same day
            return Err(Error::RewardAlreadyClaimed { date: today });
        }
        Err(err) => return Err(err),
    }

    activity::log_activity(
        &txn,
        user_id,
        "rewards.daily",
        Some(report::format_coins(amount)),
    )
    .await?;

    let new_balance = wallet::refresh_wallet(&txn, &wallet).await?.balance;
    txn.commit().await?;
    info!(new_balance, "Daily reward claimed");

    Ok(RewardClaim {
        amount,
        new_balance,
        date: today,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Transaction;
    use crate::test_utils::*;
    use sea_orm::{EntityTrait, PaginatorTrait};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[tokio::test]
    async fn test_claim_credits_once_per_day() -> Result<()> {
        let db = setup_test_db().await?;

        let claim = claim_daily_reward(&db, "user_a", 1_000, day(17)).await?;
        assert_eq!(claim.amount, 1_000);
        assert_eq!(claim.new_balance, 1_000);
        assert!(has_claimed(&db, "user_a", day(17)).await?);

        let second = claim_daily_reward(&db, "user_a", 1_000, day(17)).await;
        assert!(matches!(second, Err(Error::RewardAlreadyClaimed { date }) if date == day(17)));

        let wallet = wallet::get_wallet(&db, "user_a").await?.unwrap();
        assert_eq!(wallet.balance, 1_000);
        assert_eq!(Transaction::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_claim_again_next_day() -> Result<()> {
        let db = setup_test_db().await?;

        claim_daily_reward(&db, "user_a", 1_000, day(17)).await?;
        let next = claim_daily_reward(&db, "user_a", 1_000, day(18)).await?;
        assert_eq!(next.new_balance, 2_000);
        assert!(!has_claimed(&db, "user_a", day(19)).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_claims_credit_once() -> Result<()> {
        let db = setup_test_db().await?;

        let (first, second) = tokio::join!(
            claim_daily_reward(&db, "user_a", 1_000, day(17)),
            claim_daily_reward(&db, "user_a", 1_000, day(17))
        );
        assert!(first.is_ok() != second.is_ok());

        let wallet = wallet::get_wallet(&db, "user_a").await?.unwrap();
        assert_eq!(wallet.balance, 1_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_description_does_not_count_as_claim() -> Result<()> {
        let db = setup_test_db().await?;
        wallet::credit(
            &db,
            "user_a",
            NewEntry::new(TransactionKind::Deposit, 500)
                .with_description(Some("Daily reward".to_string())),
        )
        .await?;

        assert!(!has_claimed(&db, "user_a", day(17)).await?);
        claim_daily_reward(&db, "user_a", 1_000, day(17)).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_claims_are_per_wallet() -> Result<()> {
        let db = setup_test_db().await?;

        claim_daily_reward(&db, "user_a", 1_000, day(17)).await?;
        let other = claim_daily_reward(&db, "user_b", 1_000, day(17)).await?;
        assert_eq!(other.new_balance, 1_000);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_claims_on_shared_database() -> Result<()> {
        let shared = setup_file_test_db().await?;

        for round in 1..=10 {
            let date = day(round);
            let claim = |db: sea_orm::DatabaseConnection| {
                tokio::spawn(async move { claim_daily_reward(&db, "user_a", 1_000, date).await })
            };
            let (first, second) = tokio::join!(claim(share_pool(&shared.db)), claim(share_pool(&shared.db)));
            let results = [first.unwrap(), second.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results.iter().any(
                |r| matches!(r, Err(Error::RewardAlreadyClaimed { date: d }) if *d == date)
            ));
        }

        let wallet = wallet::get_wallet(&shared.db, "user_a").await?.unwrap();
        assert_eq!(wallet.balance, 10_000);
        assert_eq!(wallet::ledger_balance(&shared.db, wallet.id).await?, 10_000);

        Ok(())
    }
}
