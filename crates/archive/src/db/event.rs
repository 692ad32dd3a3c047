use crate::db::{
    from_json, query_all, query_one, query_optional, to_json, DbHandle, DbResult,
};
use anyhow::{anyhow, Context};
use core_types::{EventKind, GenDate};
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub handle: String,
    pub kind: EventKind,
    pub date: Option<GenDate>,
    pub description: String,
}

impl Event {
    pub fn new(handle: impl Into<String>, kind: EventKind) -> Self {
        Self {
            handle: handle.into(),
            kind,
            date: None,
            description: String::new(),
        }
    }

    pub fn insert<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        let date_json = self.date.as_ref().map(to_json).transpose()?;
        db.execute(
            "INSERT INTO events (handle, kind, date_json, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.handle,
                self.kind.as_str(),
                date_json,
                self.description
            ],
        )
        .with_context(|| format!("failed to insert event handle={}", self.handle))?;
        Ok(())
    }

    pub fn load<H: DbHandle>(db: &H, handle: &str) -> DbResult<Self> {
        query_one(
            db,
            "SELECT handle, kind, date_json, description FROM events WHERE handle = ?1",
            params![handle],
            Event::from_row,
        )
        .with_context(|| format!("failed to load event handle={handle}"))
    }

    pub fn find<H: DbHandle>(db: &H, handle: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT handle, kind, date_json, description FROM events WHERE handle = ?1",
            params![handle],
            Event::from_row,
        )
    }

    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            "SELECT handle, kind, date_json, description FROM events ORDER BY handle",
            [],
            Event::from_row,
        )
    }

    pub fn update<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        let date_json = self.date.as_ref().map(to_json).transpose()?;
        db.execute(
            "UPDATE events SET kind = ?1, date_json = ?2, description = ?3 WHERE handle = ?4",
            params![
                self.kind.as_str(),
                date_json,
                self.description,
                self.handle
            ],
        )
        .with_context(|| format!("failed to update event handle={}", self.handle))?;
        Ok(())
    }

    pub fn delete<H: DbHandle>(db: &H, handle: &str) -> DbResult<()> {
        db.execute("DELETE FROM events WHERE handle = ?1", params![handle])
            .with_context(|| format!("failed to delete event handle={handle}"))?;
        Ok(())
    }

    fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        let kind_raw: String = row.get(1)?;
        let kind = EventKind::parse(&kind_raw)
            .ok_or_else(|| anyhow!("unknown event kind: {kind_raw}"))?;
        let date = match row.get::<_, Option<String>>(2)? {
            Some(json) => Some(from_json(&json)?),
            None => None,
        };
        Ok(Self {
            handle: row.get(0)?,
            kind,
            date,
            description: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ArchiveDb;

    #[test]
    fn date_round_trip() {
        let db = ArchiveDb::in_memory().unwrap();
        let mut event = Event::new("e1", EventKind::Marriage);
        event.date = Some(GenDate::from_ymd(1890, 5, 12));
        event.insert(&db).unwrap();

        let loaded = Event::load(&db, "e1").unwrap();
        assert_eq!(loaded.kind, EventKind::Marriage);
        assert_eq!(loaded.date.unwrap().sort_value(), 18_900_512);
    }

    #[test]
    fn dateless_events_load() {
        let db = ArchiveDb::in_memory().unwrap();
        Event::new("e1", EventKind::Engagement).insert(&db).unwrap();
        assert!(Event::load(&db, "e1").unwrap().date.is_none());
    }
}
