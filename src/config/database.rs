//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The uniqueness guarantees the core
//! logic relies on (one wallet per user, one like per user, idempotency keys) are part of
//! that schema, plus two composite unique indexes created by hand.

use crate::entities::{
    ActivityLog, Availability, Booking, CommentLike, CommunityPost, Order, OrderItem,
    PostComment, PostLike, Product, Profile, Transaction, Wallet, comment_like, post_like,
};
use crate::errors::{Error, Result};
use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, RuntimeErr, Schema, sqlx,
};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/jestfly.sqlite?mode=rwc";

/// Primary `SQLite` result code for `SQLITE_BUSY`; extended codes keep it in the low byte.
const SQLITE_BUSY: i32 = 5;
const BUSY_RETRY_ATTEMPTS: u32 = 10;
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(5);

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to database at {database_url}");

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Whether `err` is `SQLite` refusing a lock because another connection holds it.
///
/// A deferred transaction that has already read cannot wait for the write lock, so
/// `SQLite` fails it immediately with `SQLITE_BUSY` instead of invoking the busy timeout.
#[must_use]
pub fn is_busy(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return false;
    };
    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| code & 0xff == SQLITE_BUSY)
}

/// Runs a read-then-write transaction, starting it over while `SQLite` reports busy.
///
/// `operation` must open and commit its own transaction so every attempt starts from a
/// fresh snapshot. The losing side of a race then re-reads the winner's writes and
/// fails with the matching domain error instead of a lock error.
pub async fn retry_on_busy<T, F, Fut>(mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(Error::Database(err)) if attempt < BUSY_RETRY_ATTEMPTS && is_busy(&err) => {
                debug!(attempt, "Database busy, restarting transaction");
                tokio::time::sleep(BUSY_RETRY_DELAY * attempt).await;
                attempt += 1;
            }
            Err(Error::Database(err)) if is_busy(&err) => {
                warn!(attempt, "Database still busy, giving up");
                return Err(Error::Database(err));
            }
            result => return result,
        }
    }
}

/// Creates all tables and indexes that do not exist yet.
///
/// Parents are created before children so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_entity_table(db, &schema, Profile).await?;
    create_entity_table(db, &schema, Wallet).await?;
    create_entity_table(db, &schema, Transaction).await?;
    create_entity_table(db, &schema, Booking).await?;
    create_entity_table(db, &schema, Availability).await?;
    create_entity_table(db, &schema, Product).await?;
    create_entity_table(db, &schema, Order).await?;
    create_entity_table(db, &schema, OrderItem).await?;
    create_entity_table(db, &schema, CommunityPost).await?;
    create_entity_table(db, &schema, PostComment).await?;
    create_entity_table(db, &schema, PostLike).await?;
    create_entity_table(db, &schema, CommentLike).await?;
    create_entity_table(db, &schema, ActivityLog).await?;

    create_unique_like_indexes(db).await?;

    info!("Database schema is up to date");
    Ok(())
}

async fn create_entity_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let table = schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }

    debug!("Ensured table {}", entity.table_name());
    Ok(())
}

async fn create_unique_like_indexes(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();

    let post_likes = Index::create()
        .name("idx-post_likes-post_id-user_id")
        .table(PostLike)
        .col(post_like::Column::PostId)
        .col(post_like::Column::UserId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&post_likes)).await?;

    let comment_likes = Index::create()
        .name("idx-comment_likes-comment_id-user_id")
        .table(CommentLike)
        .col(comment_like::Column::CommentId)
        .col(comment_like::Column::UserId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&comment_likes)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BookingModel, ProfileModel, TransactionModel, WalletModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProfileModel> = Profile::find().limit(1).all(&db).await?;
        let _: Vec<WalletModel> = Wallet::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<BookingModel> = Booking::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[test]
    fn test_is_busy_ignores_other_errors() {
        assert!(!is_busy(&DbErr::Custom("database is locked".to_string())));
        assert!(!is_busy(&DbErr::RecordNotFound("wallet".to_string())));
    }

    #[tokio::test]
    async fn test_retry_on_busy_passes_through_results() -> Result<()> {
        let mut calls = 0;
        let value = retry_on_busy(|| {
            calls += 1;
            async { Ok(7) }
        })
        .await?;
        assert_eq!(value, 7);
        assert_eq!(calls, 1);

        let mut calls = 0;
        let result: Result<()> = retry_on_busy(|| {
            calls += 1;
            async { Err(Error::validation("nope")) }
        })
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(calls, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_lock_upgrade_conflict_is_busy() -> Result<()> {
        use crate::core::activity::log_activity;
        use sea_orm::TransactionTrait;

        let shared = crate::test_utils::setup_file_test_db().await?;
        let db = &shared.db;
        let first = db.begin().await?;
        let second = db.begin().await?;
        Profile::find().all(&first).await?;
        Profile::find().all(&second).await?;

        log_activity(&first, "alice", "test.write", None).await?;
        let err = log_activity(&second, "bob", "test.write", None).await.err();
        assert!(matches!(err, Some(Error::Database(ref e)) if is_busy(e)));

        drop(second);
        first.commit().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
