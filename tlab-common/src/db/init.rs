//! Database initialization
//!
//! Creates the SQLite file and schema on first run. Schema creation is
//! idempotent, so every service runs it at startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Lock wait before SQLite reports the database as busy
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open (creating if needed) the database at `db_path` and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL lets readers proceed while a submission holds the write lock
    let options = connect_options()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database with the full schema
///
/// Limited to one connection that is never recycled: every SQLite in-memory
/// connection is its own database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options().in_memory(true))
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Pragmas applied to every pooled connection
fn connect_options() -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_documents_table(pool).await?;
    create_worksheets_table(pool).await?;
    create_sheet_rows_table(pool).await?;
    Ok(())
}

async fn create_documents_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            unique_key TEXT,
            body TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // NULL keys never collide, so plain inserts are unconstrained
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_unique_key ON documents(collection, unique_key)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_worksheets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS worksheets (
            spreadsheet TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (spreadsheet, title)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sheet_rows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sheet_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            spreadsheet TEXT NOT NULL,
            title TEXT NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 1),
            cells TEXT NOT NULL,
            value_input TEXT NOT NULL DEFAULT 'raw',
            inherit_from_before INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (spreadsheet, title) REFERENCES worksheets(spreadsheet, title) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sheet_rows_position ON sheet_rows(spreadsheet, title, position)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
