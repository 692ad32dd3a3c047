use crate::db::{parse_datetime, query_all, query_optional, to_rfc3339, DbHandle, DbResult};
use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One undo-history entry: a label for a group of edits committed as a
/// single logical change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoEntry {
    pub id: i64,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl UndoEntry {
    pub fn record<H: DbHandle>(db: &H, label: &str) -> DbResult<i64> {
        db.execute(
            "INSERT INTO undo_history (label, created_at) VALUES (?1, ?2)",
            params![label, to_rfc3339(Utc::now())],
        )
        .with_context(|| format!("failed to record undo entry {label}"))?;
        Ok(db.last_insert_rowid())
    }

    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            "SELECT id, label, created_at FROM undo_history ORDER BY id DESC",
            [],
            UndoEntry::from_row,
        )
    }

    pub fn latest<H: DbHandle>(db: &H) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT id, label, created_at FROM undo_history ORDER BY id DESC LIMIT 1",
            [],
            UndoEntry::from_row,
        )
    }

    fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            created_at: parse_datetime(row.get::<_, String>(2)?, "created_at")?,
        })
    }
}
