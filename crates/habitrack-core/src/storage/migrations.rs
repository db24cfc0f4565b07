//! Database schema migrations for habitrack.
//!
//! Migrations are versioned and applied automatically when opening the store.
//! The `schema_version` table tracks the current migration version.

use indoc::indoc;
use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    tracing::debug!(version, "schema migrated");
    Ok(())
}

/// Migration v1: habits, patterns, completions, lists and categories.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS habits (
            id           TEXT PRIMARY KEY,
            name         TEXT NOT NULL,
            kind         TEXT NOT NULL DEFAULT 'positive',
            start_date   TEXT NOT NULL,
            list_id      TEXT,
            category_id  TEXT,
            is_archived  INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS repeat_patterns (
            id             TEXT PRIMARY KEY,
            habit_id       TEXT NOT NULL,
            position       INTEGER NOT NULL,
            effective_from TEXT NOT NULL,
            cadence        TEXT
        );

        CREATE TABLE IF NOT EXISTS completions (
            id          TEXT PRIMARY KEY,
            habit_id    TEXT NOT NULL,
            day         TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            completed   INTEGER NOT NULL,
            UNIQUE (habit_id, day)
        );

        CREATE TABLE IF NOT EXISTS habit_lists (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            icon       TEXT NOT NULL DEFAULT '',
            color      TEXT NOT NULL DEFAULT '',
            sort_order INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS habit_categories (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            icon       TEXT NOT NULL DEFAULT '',
            color      TEXT NOT NULL DEFAULT '',
            sort_order INTEGER NOT NULL DEFAULT 0,
            is_default INTEGER NOT NULL DEFAULT 0
        );
    "})?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: habit intensity, follow-up patterns, lookup indexes.
///
/// Existing habits get the default intensity (2) and existing patterns start
/// their own phase.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(indoc! {"
        ALTER TABLE habits ADD COLUMN intensity INTEGER NOT NULL DEFAULT 2;
        ALTER TABLE repeat_patterns ADD COLUMN follow_up INTEGER NOT NULL DEFAULT 0;
        CREATE INDEX IF NOT EXISTS idx_patterns_habit ON repeat_patterns (habit_id, position);
        CREATE INDEX IF NOT EXISTS idx_completions_habit ON completions (habit_id, day);
    "})?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}
