//! SQLite schema DDL and initialization for archive files.

use rusqlite::{Connection, Error as SqliteError, ErrorCode, OptionalExtension};

/// SQLite schema version supported by this build.
pub const TARGET_SCHEMA_VERSION: i64 = 1;

/// Packed SQL definition for the complete archive schema.
pub const ARCHIVE_SCHEMA_SQL: &str = include_str!("../schema/archive_schema.sql");

/// Applies the archive schema on the provided connection.
///
/// Enforces WAL journaling + foreign keys, creates any missing tables,
/// ensures the `archive_metadata` row exists, and keeps `PRAGMA user_version`
/// aligned with the Rust-side [`TARGET_SCHEMA_VERSION`]. Opening an archive
/// written by a newer build is a hard error rather than a silent downgrade.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;

    let user_version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if user_version > TARGET_SCHEMA_VERSION {
        return Err(newer_schema_error(user_version));
    }

    conn.execute_batch(ARCHIVE_SCHEMA_SQL)?;

    let recorded_version: i64 = conn
        .query_row(
            "SELECT schema_version FROM archive_metadata WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);
    if recorded_version > TARGET_SCHEMA_VERSION {
        return Err(newer_schema_error(recorded_version));
    }

    conn.execute(
        "INSERT INTO archive_metadata (id, schema_version)
         VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET
            schema_version = excluded.schema_version,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')",
        [TARGET_SCHEMA_VERSION],
    )?;

    conn.pragma_update(None, "user_version", TARGET_SCHEMA_VERSION)?;
    Ok(())
}

fn newer_schema_error(version: i64) -> SqliteError {
    SqliteError::SqliteFailure(
        rusqlite::ffi::Error {
            code: ErrorCode::DatabaseCorrupt,
            extended_code: 0,
        },
        Some(format!(
            "archive schema version {version} is newer than supported {TARGET_SCHEMA_VERSION}"
        )),
    )
}
