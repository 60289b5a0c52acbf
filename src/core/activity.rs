//! User activity log - Append-only audit trail for the admin dashboard.
//!
//! [`log_activity`] is generic over the connection so operations can record their
//! activity inside their own database transaction.

use crate::{
    entities::{ActivityLog, activity_log},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Records that `user_id` performed `action`.
pub async fn log_activity<C>(
    db: &C,
    user_id: &str,
    action: &str,
    details: Option<String>,
) -> Result<activity_log::Model>
where
    C: ConnectionTrait,
{
    let entry = activity_log::ActiveModel {
        user_id: Set(user_id.to_string()),
        action: Set(action.to_string()),
        details: Set(details),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Most recent activity across all users, newest first.
pub async fn recent_activity(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<activity_log::Model>> {
    ActivityLog::find()
        .order_by_desc(activity_log::Column::CreatedAt)
        .order_by_desc(activity_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Most recent activity of one user, newest first.
pub async fn activity_for_user(
    db: &DatabaseConnection,
    user_id: &str,
    limit: u64,
) -> Result<Vec<activity_log::Model>> {
    ActivityLog::find()
        .filter(activity_log::Column::UserId.eq(user_id))
        .order_by_desc(activity_log::Column::CreatedAt)
        .order_by_desc(activity_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_log_and_list_activity() -> Result<()> {
        let db = setup_test_db().await?;

        log_activity(&db, "user_a", "wallet.transfer", Some("5.00 JC to user_b".to_string()))
            .await?;
        log_activity(&db, "user_b", "booking.create", None).await?;
        log_activity(&db, "user_a", "rewards.daily", None).await?;

        let recent = recent_activity(&db, 2).await?;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "rewards.daily");
        assert_eq!(recent[1].action, "booking.create");

        let mine = activity_for_user(&db, "user_a", 10).await?;
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|entry| entry.user_id == "user_a"));

        Ok(())
    }
}
