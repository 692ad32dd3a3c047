use crate::db::{
    from_json, query_all, query_one, query_optional, to_json, DbHandle, DbResult,
};
use anyhow::{anyhow, Context};
use core_types::{Attribute, NoteFormat, SourceRef};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// A stored file record (image, document) with descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaObject {
    pub handle: String,
    pub id: String,
    pub path: String,
    pub mime_type: String,
    pub description: String,
    pub privacy: bool,
    pub note: String,
    pub note_format: NoteFormat,
    pub attributes: Vec<Attribute>,
    pub source_refs: Vec<SourceRef>,
    pub file_hash: Option<String>,
    pub change_time: i64,
}

impl MediaObject {
    pub fn insert<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "INSERT INTO media (
                handle, id, path, mime_type, description, privacy, note,
                note_format, attributes_json, source_refs_json, file_hash,
                change_time
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.handle,
                self.id,
                self.path,
                self.mime_type,
                self.description,
                self.privacy,
                self.note,
                self.note_format.as_str(),
                to_json(&self.attributes)?,
                to_json(&self.source_refs)?,
                self.file_hash,
                self.change_time
            ],
        )
        .with_context(|| format!("failed to insert media object handle={}", self.handle))?;
        Ok(())
    }

    pub fn load<H: DbHandle>(db: &H, handle: &str) -> DbResult<Self> {
        query_one(
            db,
            "SELECT handle, id, path, mime_type, description, privacy, note,
                    note_format, attributes_json, source_refs_json, file_hash,
                    change_time
             FROM media WHERE handle = ?1",
            params![handle],
            MediaObject::from_row,
        )
        .with_context(|| format!("failed to load media object handle={handle}"))
    }

    pub fn find<H: DbHandle>(db: &H, handle: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT handle, id, path, mime_type, description, privacy, note,
                    note_format, attributes_json, source_refs_json, file_hash,
                    change_time
             FROM media WHERE handle = ?1",
            params![handle],
            MediaObject::from_row,
        )
    }

    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            "SELECT handle, id, path, mime_type, description, privacy, note,
                    note_format, attributes_json, source_refs_json, file_hash,
                    change_time
             FROM media ORDER BY id",
            [],
            MediaObject::from_row,
        )
    }

    pub fn handles<H: DbHandle>(db: &H) -> DbResult<Vec<String>> {
        query_all(
            db,
            "SELECT handle FROM media ORDER BY id",
            [],
            |row| Ok(row.get(0)?),
        )
    }

    /// Attach-time dedup: a file already cataloged under the same path is
    /// referenced rather than imported twice.
    pub fn find_by_path<H: DbHandle>(db: &H, path: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT handle, id, path, mime_type, description, privacy, note,
                    note_format, attributes_json, source_refs_json, file_hash,
                    change_time
             FROM media WHERE path = ?1",
            params![path],
            MediaObject::from_row,
        )
    }

    pub fn update<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        db.execute(
            "UPDATE media SET
                id = ?1,
                path = ?2,
                mime_type = ?3,
                description = ?4,
                privacy = ?5,
                note = ?6,
                note_format = ?7,
                attributes_json = ?8,
                source_refs_json = ?9,
                file_hash = ?10,
                change_time = ?11
             WHERE handle = ?12",
            params![
                self.id,
                self.path,
                self.mime_type,
                self.description,
                self.privacy,
                self.note,
                self.note_format.as_str(),
                to_json(&self.attributes)?,
                to_json(&self.source_refs)?,
                self.file_hash,
                self.change_time,
                self.handle
            ],
        )
        .with_context(|| format!("failed to update media object handle={}", self.handle))?;
        Ok(())
    }

    pub fn delete<H: DbHandle>(db: &H, handle: &str) -> DbResult<()> {
        db.execute("DELETE FROM media WHERE handle = ?1", params![handle])
            .with_context(|| format!("failed to delete media object handle={handle}"))?;
        Ok(())
    }

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        let format_raw: String = row.get(7)?;
        let note_format = NoteFormat::parse(&format_raw)
            .ok_or_else(|| anyhow!("unknown note format: {format_raw}"))?;
        Ok(Self {
            handle: row.get(0)?,
            id: row.get(1)?,
            path: row.get(2)?,
            mime_type: row.get(3)?,
            description: row.get(4)?,
            privacy: row.get(5)?,
            note: row.get(6)?,
            note_format,
            attributes: from_json(&row.get::<_, String>(8)?)?,
            source_refs: from_json(&row.get::<_, String>(9)?)?,
            file_hash: row.get(10)?,
            change_time: row.get(11)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ArchiveDb;

    fn sample(handle: &str, id: &str, path: &str) -> MediaObject {
        MediaObject {
            handle: handle.into(),
            id: id.into(),
            path: path.into(),
            mime_type: "image/jpeg".into(),
            description: "wedding portrait".into(),
            privacy: false,
            note: String::new(),
            note_format: NoteFormat::Flowed,
            attributes: Vec::new(),
            source_refs: Vec::new(),
            file_hash: None,
            change_time: 0,
        }
    }

    #[test]
    fn insert_and_load_round_trip() {
        let db = ArchiveDb::in_memory().unwrap();
        let mut object = sample("m1", "O0001", "/media/wedding.jpg");
        object.attributes.push(Attribute::new("Photographer", "J. Doe"));
        object.insert(&db).unwrap();

        let loaded = MediaObject::load(&db, "m1").unwrap();
        assert_eq!(loaded.description, "wedding portrait");
        assert_eq!(loaded.attributes.len(), 1);
        assert_eq!(loaded.note_format, NoteFormat::Flowed);
    }

    #[test]
    fn find_by_path_dedups() {
        let db = ArchiveDb::in_memory().unwrap();
        sample("m1", "O0001", "/media/wedding.jpg").insert(&db).unwrap();

        let hit = MediaObject::find_by_path(&db, "/media/wedding.jpg").unwrap();
        assert_eq!(hit.map(|m| m.handle), Some("m1".to_string()));
        assert!(MediaObject::find_by_path(&db, "/media/other.jpg")
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_removes_row() {
        let db = ArchiveDb::in_memory().unwrap();
        sample("m1", "O0001", "/media/wedding.jpg").insert(&db).unwrap();
        MediaObject::delete(&db, "m1").unwrap();
        assert!(MediaObject::find(&db, "m1").unwrap().is_none());
    }
}
