//! Database access layer
//!
//! SQLite-backed content store for learning sets, vocabulary, cues,
//! sentences, AI provider configurations and generation run records.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

mod init;
pub mod models;
pub mod store;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure(&pool).await?;
    init::create_schema(&pool).await?;

    Ok(pool)
}

/// Connect to an in-memory database with the full schema
///
/// Single connection: each SQLite memory database is private to its
/// connection. Used by the test suites.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure(&pool).await?;
    init::create_schema(&pool).await?;

    Ok(pool)
}

async fn configure(pool: &SqlitePool) -> Result<()> {
    // Cascade deletes depend on foreign key enforcement
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}
