//! Database test utilities
//!
//! Provides SQLite pools for testing.
//!
//! Note: Schema setup should be done by the consuming crate since
//! schema definitions live in the tracker crate.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tempfile::TempDir;

/// Database connection pool type alias
pub type TestDbPool = SqlitePool;

/// Create an in-memory SQLite connection pool for testing.
///
/// This creates a fresh database with no schema. The caller is responsible
/// for setting up any required schema.
pub async fn open_test_db() -> Result<TestDbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // Single connection for in-memory to maintain state
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create a file-backed SQLite pool inside a fresh temporary directory.
///
/// The returned `TempDir` must be kept alive for as long as the pool is used;
/// dropping it removes the database file.
pub async fn open_file_test_db(max_connections: u32) -> Result<(TempDir, TestDbPool)> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("test-state.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok((temp_dir, pool))
}
