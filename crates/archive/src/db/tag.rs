use crate::db::{query_all, query_one, query_optional, DbHandle, DbResult};
use anyhow::Context;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// User-defined marker with a display color. When several tags apply to a
/// record, the lowest priority number elects the representative color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub handle: String,
    pub name: String,
    pub color: String,
    pub priority: i64,
}

impl Tag {
    pub fn insert<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "INSERT INTO tags (handle, name, color, priority) VALUES (?1, ?2, ?3, ?4)",
            params![self.handle, self.name, self.color, self.priority],
        )
        .with_context(|| format!("failed to insert tag {}", self.name))?;
        Ok(())
    }

    pub fn load<H: DbHandle>(db: &H, handle: &str) -> DbResult<Self> {
        query_one(
            db,
            "SELECT handle, name, color, priority FROM tags WHERE handle = ?1",
            params![handle],
            Tag::from_row,
        )
        .with_context(|| format!("failed to load tag handle={handle}"))
    }

    pub fn find<H: DbHandle>(db: &H, handle: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT handle, name, color, priority FROM tags WHERE handle = ?1",
            params![handle],
            Tag::from_row,
        )
    }

    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            "SELECT handle, name, color, priority FROM tags ORDER BY priority, name",
            [],
            Tag::from_row,
        )
    }

    pub fn update<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "UPDATE tags SET name = ?1, color = ?2, priority = ?3 WHERE handle = ?4",
            params![self.name, self.color, self.priority, self.handle],
        )
        .with_context(|| format!("failed to update tag handle={}", self.handle))?;
        Ok(())
    }

    pub fn delete<H: DbHandle>(db: &H, handle: &str) -> DbResult<()> {
        db.execute("DELETE FROM tags WHERE handle = ?1", params![handle])
            .with_context(|| format!("failed to delete tag handle={handle}"))?;
        Ok(())
    }

    fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        Ok(Self {
            handle: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            priority: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ArchiveDb;

    #[test]
    fn load_all_orders_by_priority() {
        let db = ArchiveDb::in_memory().unwrap();
        for (handle, name, priority) in [("t1", "todo", 3), ("t2", "verified", 1)] {
            Tag {
                handle: handle.into(),
                name: name.into(),
                color: "#2e7d32".into(),
                priority,
            }
            .insert(&db)
            .unwrap();
        }

        let tags = Tag::load_all(&db).unwrap();
        assert_eq!(tags[0].name, "verified");
        assert_eq!(tags[1].name, "todo");
    }
}
