use crate::db::{
    from_json, query_all, query_one, query_optional, to_json, DbHandle, DbResult, HostKind,
    MediaHost,
};
use anyhow::Context;
use core_types::MediaRef;
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub handle: String,
    pub id: String,
    pub title: String,
    pub media_refs: Vec<MediaRef>,
    pub tags: Vec<String>,
    pub change_time: i64,
}

impl Place {
    pub fn new(
        handle: impl Into<String>,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            id: id.into(),
            title: title.into(),
            media_refs: Vec::new(),
            tags: Vec::new(),
            change_time: 0,
        }
    }

    pub fn insert<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "INSERT INTO places (handle, id, title, media_refs_json, tags_json, change_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.handle,
                self.id,
                self.title,
                to_json(&self.media_refs)?,
                to_json(&self.tags)?,
                self.change_time
            ],
        )
        .with_context(|| format!("failed to insert place handle={}", self.handle))?;
        Ok(())
    }

    pub fn load<H: DbHandle>(db: &H, handle: &str) -> DbResult<Self> {
        query_one(
            db,
            "SELECT handle, id, title, media_refs_json, tags_json, change_time
             FROM places WHERE handle = ?1",
            params![handle],
            Place::from_row,
        )
        .with_context(|| format!("failed to load place handle={handle}"))
    }

    pub fn find<H: DbHandle>(db: &H, handle: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT handle, id, title, media_refs_json, tags_json, change_time
             FROM places WHERE handle = ?1",
            params![handle],
            Place::from_row,
        )
    }

    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            "SELECT handle, id, title, media_refs_json, tags_json, change_time
             FROM places ORDER BY id",
            [],
            Place::from_row,
        )
    }

    pub fn handles<H: DbHandle>(db: &H) -> DbResult<Vec<String>> {
        query_all(db, "SELECT handle FROM places ORDER BY id", [], |row| {
            Ok(row.get(0)?)
        })
    }

    pub fn update<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "UPDATE places SET
                id = ?1, title = ?2, media_refs_json = ?3, tags_json = ?4,
                change_time = ?5
             WHERE handle = ?6",
            params![
                self.id,
                self.title,
                to_json(&self.media_refs)?,
                to_json(&self.tags)?,
                self.change_time,
                self.handle
            ],
        )
        .with_context(|| format!("failed to update place handle={}", self.handle))?;
        Ok(())
    }

    pub fn delete<H: DbHandle>(db: &H, handle: &str) -> DbResult<()> {
        db.execute("DELETE FROM places WHERE handle = ?1", params![handle])
            .with_context(|| format!("failed to delete place handle={handle}"))?;
        Ok(())
    }

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        Ok(Self {
            handle: row.get(0)?,
            id: row.get(1)?,
            title: row.get(2)?,
            media_refs: from_json(&row.get::<_, String>(3)?)?,
            tags: from_json(&row.get::<_, String>(4)?)?,
            change_time: row.get(5)?,
        })
    }
}

impl MediaHost for Place {
    fn kind(&self) -> HostKind {
        HostKind::Place
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    fn public_id(&self) -> &str {
        &self.id
    }

    fn media_refs(&self) -> &[MediaRef] {
        &self.media_refs
    }

    fn media_refs_mut(&mut self) -> &mut Vec<MediaRef> {
        &mut self.media_refs
    }

    fn set_media_refs(&mut self, refs: Vec<MediaRef>) {
        self.media_refs = refs;
    }

    fn set_change_time(&mut self, epoch: i64) {
        self.change_time = epoch;
    }

    fn save<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        self.update(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ArchiveDb;

    #[test]
    fn tags_round_trip() {
        let db = ArchiveDb::in_memory().unwrap();
        let mut place = Place::new("pl1", "P0001", "Oldtown church");
        place.tags.push("t1".into());
        place.insert(&db).unwrap();
        let loaded = Place::load(&db, "pl1").unwrap();
        assert_eq!(loaded.tags, ["t1"]);
    }
}
