//! SQLite connection pool with WAL mode.
//!
//! The scheduler loop and the CLI command can touch the database at the same
//! time, so the pool runs in Write-Ahead Logging mode.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<Sqlite>;

/// Create a new connection pool with WAL mode enabled.
///
/// Only the database file is created; the parent directory must exist.
pub async fn create_pool(db_path: &Path) -> Result<DbPool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(10));

    SqlitePoolOptions::new()
        // Writes are rare (one row per delivery); a couple of connections is plenty
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}
