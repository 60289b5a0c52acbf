//! Shared test utilities for JESTFLY.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        booking, profile, store,
        wallet::{self, NewEntry},
    },
    entities::{self, BookingType, TransactionKind},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use std::path::PathBuf;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
///
/// The pool holds a single connection: every connection to `sqlite::memory:` opens a
/// separate database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A file-backed test database shared by several pooled connections.
///
/// Concurrent callers really interleave here, unlike on [`setup_test_db`], so races hit
/// the guarded updates, unique constraints and `SQLite` lock conflicts. The file is
/// removed on drop.
pub struct FileTestDb {
    /// Pool over the database file
    pub db: DatabaseConnection,
    path: PathBuf,
}

impl Drop for FileTestDb {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// Creates a fresh `SQLite` file in the temp directory with a pool of four connections.
pub async fn setup_file_test_db() -> Result<FileTestDb> {
    let path = std::env::temp_dir().join(format!("jestfly-test-{}.sqlite", uuid::Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(4)
        .min_connections(4)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(FileTestDb { db, path })
}

/// Returns another handle on the same `SQLite` pool.
///
/// Stands in for `DatabaseConnection::clone`, which sea-orm drops when its `mock`
/// feature is enabled (as it is for the test build).
pub fn share_pool(db: &DatabaseConnection) -> DatabaseConnection {
    SqlxSqliteConnector::from_sqlx_sqlite_pool(db.get_sqlite_connection_pool().clone())
}

/// Creates a profile whose username is the user ID.
pub async fn create_test_profile(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<entities::profile::Model> {
    profile::ensure_profile(db, user_id, user_id).await
}

/// Credits `amount` minor units to a user's wallet as a deposit.
pub async fn fund_wallet(
    db: &DatabaseConnection,
    user_id: &str,
    amount: i64,
) -> Result<entities::wallet::Model> {
    let entry = NewEntry::new(TransactionKind::Deposit, amount)
        .with_description(Some("Test funds".to_string()));
    let (wallet, _) = wallet::credit(db, user_id, entry).await?;
    Ok(wallet)
}

/// Creates a product without description.
///
/// # Arguments
/// * `price` - Unit price in minor units
/// * `stock` - `None` for unlimited
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    stock: Option<i32>,
) -> Result<entities::product::Model> {
    store::create_product(db, name, None, price, stock).await
}

/// Opens an availability window on behalf of a test admin.
pub async fn open_test_window(
    db: &DatabaseConnection,
    booking_type: BookingType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<entities::availability::Model> {
    booking::open_availability(db, "test_admin", booking_type, start, end).await
}
