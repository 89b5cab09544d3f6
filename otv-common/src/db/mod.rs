//! Database access for the OmniverseTV backend
//!
//! SQLite via sqlx. Services create the tables they rely on idempotently at
//! startup; there is no separate migration step.

pub mod translations;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::Result;

/// Open a connection pool for `database_url`
/// (e.g. `sqlite://omniverse.db?mode=rwc` or `sqlite::memory:`).
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>> {
    // An in-memory database exists per connection; more than one connection
    // in the pool would see different (empty) databases.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create the catalog and translation tables if they do not exist yet.
pub async fn bootstrap_schema(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Ensuring database schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS packages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            description TEXT NOT NULL,
            price       REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            name             TEXT NOT NULL,
            description      TEXT NOT NULL,
            dimension_origin TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS translations (
            id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            item_kind              TEXT NOT NULL CHECK (item_kind IN ('package', 'channel')),
            item_id                INTEGER NOT NULL,
            language_code          TEXT NOT NULL,
            translated_name        TEXT NOT NULL,
            translated_description TEXT NOT NULL,
            created_at             TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The natural key of a translation; find-or-create leans on this.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_translations_item_language
        ON translations (item_kind, item_id, language_code)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
