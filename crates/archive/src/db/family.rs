use crate::db::{
    from_json, query_all, query_one, query_optional, to_json, DbHandle, DbResult, HostKind,
    MediaHost,
};
use anyhow::{anyhow, Context};
use core_types::{EventRef, MediaRef, RelationshipType};
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub handle: String,
    pub id: String,
    pub father_handle: Option<String>,
    pub mother_handle: Option<String>,
    pub rel_type: RelationshipType,
    pub event_refs: Vec<EventRef>,
    pub media_refs: Vec<MediaRef>,
    pub tags: Vec<String>,
    pub change_time: i64,
}

impl Family {
    pub fn new(handle: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            id: id.into(),
            father_handle: None,
            mother_handle: None,
            rel_type: RelationshipType::Unknown,
            event_refs: Vec::new(),
            media_refs: Vec::new(),
            tags: Vec::new(),
            change_time: 0,
        }
    }

    pub fn insert<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "INSERT INTO families (
                handle, id, father_handle, mother_handle, rel_type,
                event_refs_json, media_refs_json, tags_json, change_time
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.handle,
                self.id,
                self.father_handle,
                self.mother_handle,
                self.rel_type.as_str(),
                to_json(&self.event_refs)?,
                to_json(&self.media_refs)?,
                to_json(&self.tags)?,
                self.change_time
            ],
        )
        .with_context(|| format!("failed to insert family handle={}", self.handle))?;
        Ok(())
    }

    pub fn load<H: DbHandle>(db: &H, handle: &str) -> DbResult<Self> {
        query_one(
            db,
            "SELECT handle, id, father_handle, mother_handle, rel_type,
                    event_refs_json, media_refs_json, tags_json, change_time
             FROM families WHERE handle = ?1",
            params![handle],
            Family::from_row,
        )
        .with_context(|| format!("failed to load family handle={handle}"))
    }

    pub fn find<H: DbHandle>(db: &H, handle: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT handle, id, father_handle, mother_handle, rel_type,
                    event_refs_json, media_refs_json, tags_json, change_time
             FROM families WHERE handle = ?1",
            params![handle],
            Family::from_row,
        )
    }

    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            "SELECT handle, id, father_handle, mother_handle, rel_type,
                    event_refs_json, media_refs_json, tags_json, change_time
             FROM families ORDER BY id",
            [],
            Family::from_row,
        )
    }

    pub fn handles<H: DbHandle>(db: &H) -> DbResult<Vec<String>> {
        query_all(db, "SELECT handle FROM families ORDER BY id", [], |row| {
            Ok(row.get(0)?)
        })
    }

    pub fn update<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "UPDATE families SET
                id = ?1, father_handle = ?2, mother_handle = ?3, rel_type = ?4,
                event_refs_json = ?5, media_refs_json = ?6, tags_json = ?7,
                change_time = ?8
             WHERE handle = ?9",
            params![
                self.id,
                self.father_handle,
                self.mother_handle,
                self.rel_type.as_str(),
                to_json(&self.event_refs)?,
                to_json(&self.media_refs)?,
                to_json(&self.tags)?,
                self.change_time,
                self.handle
            ],
        )
        .with_context(|| format!("failed to update family handle={}", self.handle))?;
        Ok(())
    }

    pub fn delete<H: DbHandle>(db: &H, handle: &str) -> DbResult<()> {
        db.execute("DELETE FROM families WHERE handle = ?1", params![handle])
            .with_context(|| format!("failed to delete family handle={handle}"))?;
        Ok(())
    }

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        let rel_raw: String = row.get(4)?;
        let rel_type = RelationshipType::parse(&rel_raw)
            .ok_or_else(|| anyhow!("unknown relationship type: {rel_raw}"))?;
        Ok(Self {
            handle: row.get(0)?,
            id: row.get(1)?,
            father_handle: row.get(2)?,
            mother_handle: row.get(3)?,
            rel_type,
            event_refs: from_json(&row.get::<_, String>(5)?)?,
            media_refs: from_json(&row.get::<_, String>(6)?)?,
            tags: from_json(&row.get::<_, String>(7)?)?,
            change_time: row.get(8)?,
        })
    }
}

impl MediaHost for Family {
    fn kind(&self) -> HostKind {
        HostKind::Family
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
