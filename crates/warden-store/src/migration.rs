//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Users: one row per subject, node list as a CBOR blob
        CREATE TABLE users (
            id TEXT PRIMARY KEY,              -- UUID, canonical hyphenated form
            username TEXT,                    -- cached display name, nullable
            primary_group TEXT NOT NULL,
            nodes BLOB NOT NULL               -- CBOR array of node records
        );

        -- Groups: one row per group
        CREATE TABLE groups (
            name TEXT PRIMARY KEY,
            nodes BLOB NOT NULL               -- CBOR array of node records
        );

        -- Tracks: ordered group ladders
        CREATE TABLE tracks (
            name TEXT PRIMARY KEY,
            groups BLOB NOT NULL              -- CBOR array of group names
        );

        -- Append-only audit log
        CREATE TABLE actions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,       -- Unix ms
            actor TEXT,                       -- acting user's UUID, nullable
            actor_name TEXT NOT NULL,
            acted TEXT NOT NULL,              -- target identifier
            acted_name TEXT NOT NULL,
            action TEXT NOT NULL
        );

        CREATE INDEX idx_users_username ON users(username);
        CREATE INDEX idx_actions_timestamp ON actions(timestamp);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
