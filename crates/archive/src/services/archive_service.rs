use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::Context;
use blake3::Hasher;
use chrono::Utc;
use core_types::{MediaRef, Name, NoteFormat};
use rusqlite::Transaction;
use tracing::debug;

use crate::db::{
    query_one, ArchiveDb, DbResult, Family, HostKind, MediaHost, MediaObject, Person, Place,
    Source, UndoEntry,
};
use crate::{ArchiveError, Result};

/// One record that references a given media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backref {
    pub kind: HostKind,
    pub id: String,
    pub label: String,
}

/// High-level archive operations that sit above the raw row bindings.
pub struct ArchiveService {
    pub db: ArchiveDb,
}

impl ArchiveService {
    pub fn new(db: ArchiveDb) -> Self {
        Self { db }
    }

    /// Run `f` inside a single transaction and record one undo-history
    /// entry under `label`. Any error rolls the whole group back; nothing
    /// is ever partially committed.
    pub fn grouped<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&Transaction<'_>) -> DbResult<T>,
    ) -> Result<T> {
        let tx = self.db.transaction()?;
        let out = f(&tx).map_err(ArchiveError::Store)?;
        UndoEntry::record(&tx, label).map_err(ArchiveError::Store)?;
        tx.commit()?;
        Ok(out)
    }

    /// Persist a mutated owning record as one undo group.
    pub fn commit_host<H: MediaHost>(&mut self, label: &str, owner: &H) -> Result<()> {
        self.grouped(label, |tx| owner.save(tx))
    }

    /// Persist a mutated media object as one undo group.
    pub fn commit_media_object(&mut self, label: &str, object: &MediaObject) -> Result<()> {
        self.grouped(label, |tx| object.update(tx))
    }

    /// Delete a media object and sweep every owning record class for
    /// references to it. Each class iterates its own records; records whose
    /// media list did not change are left untouched. The sweep, the object
    /// deletion and the undo entry commit together or not at all.
    pub fn remove_media_object(&mut self, handle: &str) -> Result<()> {
        if MediaObject::find(&self.db, handle)
            .map_err(ArchiveError::Store)?
            .is_none()
        {
            return Err(ArchiveError::UnknownHandle(handle.to_string()));
        }

        let target = handle.to_string();
        let swept = self.grouped("Remove Media Object", |tx| {
            let now = Utc::now().timestamp();
            let mut swept = 0usize;

            for h in Person::handles(tx)? {
                let mut person = Person::load(tx, &h)?;
                let before = person.media_refs.len();
                person.media_refs.retain(|r| r.media_handle != target);
                if person.media_refs.len() != before {
                    person.change_time = now;
                    person.update(tx)?;
                    swept += 1;
                }
            }

            for h in Family::handles(tx)? {
                let mut family = Family::load(tx, &h)?;
                let before = family.media_refs.len();
                family.media_refs.retain(|r| r.media_handle != target);
                if family.media_refs.len() != before {
                    family.change_time = now;
                    family.update(tx)?;
                    swept += 1;
                }
            }

            for h in Source::handles(tx)? {
                let mut source = Source::load(tx, &h)?;
                let before = source.media_refs.len();
                source.media_refs.retain(|r| r.media_handle != target);
                if source.media_refs.len() != before {
                    source.change_time = now;
                    source.update(tx)?;
                    swept += 1;
                }
            }

            for h in Place::handles(tx)? {
                let mut place = Place::load(tx, &h)?;
                let before = place.media_refs.len();
                place.media_refs.retain(|r| r.media_handle != target);
                if place.media_refs.len() != before {
                    place.change_time = now;
                    place.update(tx)?;
                    swept += 1;
                }
            }

            MediaObject::delete(tx, &target)?;
            Ok(swept)
        })?;

        debug!(handle, swept, "removed media object");
        Ok(())
    }

    /// List every record that references the given media object, in
    /// person / family / source / place order.
    pub fn references_to(&self, handle: &str) -> Result<Vec<Backref>> {
        let mut refs = Vec::new();

        for person in Person::load_all(&self.db).map_err(ArchiveError::Store)? {
            if person.media_refs.iter().any(|r| r.media_handle == handle) {
                refs.push(Backref {
                    kind: HostKind::Person,
                    id: person.id.clone(),
                    label: person.name.display(),
                });
            }
        }

        for family in Family::load_all(&self.db).map_err(ArchiveError::Store)? {
            if family.media_refs.iter().any(|r| r.media_handle == handle) {
                let label = self
                    .family_label(&family)
                    .map_err(ArchiveError::Store)?;
                refs.push(Backref {
                    kind: HostKind::Family,
                    id: family.id.clone(),
                    label,
                });
            }
        }

        for source in Source::load_all(&self.db).map_err(ArchiveError::Store)? {
            if source.media_refs.iter().any(|r| r.media_handle == handle) {
                refs.push(Backref {
                    kind: HostKind::Source,
                    id: source.id.clone(),
                    label: source.title.clone(),
                });
            }
        }

        for place in Place::load_all(&self.db).map_err(ArchiveError::Store)? {
            if place.media_refs.iter().any(|r| r.media_handle == handle) {
                refs.push(Backref {
                    kind: HostKind::Place,
                    id: place.id.clone(),
                    label: place.title.clone(),
                });
            }
        }

        Ok(refs)
    }

    /// Attach a file to an owning record. An object already cataloged under
    /// the same path is referenced instead of imported twice; otherwise a
    /// new media object is created with a detected mime type, a description
    /// defaulting to the file stem, and a content hash. Returns the handle
    /// of the referenced object.
    pub fn attach_media_file<H: MediaHost>(
        &mut self,
        owner: &mut H,
        path: &Path,
        description: Option<&str>,
    ) -> Result<String> {
        if !path.is_file() {
            return Err(ArchiveError::FileNotFound(path.to_path_buf()));
        }

        let path_str = path.to_string_lossy().to_string();
        let file_hash = compute_file_hash(path)?;
        let description = match description.filter(|d| !d.is_empty()) {
            Some(d) => d.to_string(),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        };

        let refs_before = owner.media_refs().len();
        let result = self.grouped("Edit Media Objects", |tx| {
            let handle = match MediaObject::find_by_path(tx, &path_str)? {
                Some(existing) => existing.handle,
                None => {
                    let serial = allocate_serial(tx)?;
                    let object = MediaObject {
                        handle: format!("m{serial:08x}"),
                        id: format!("O{serial:04}"),
                        path: path_str.clone(),
                        mime_type: mime_guess::from_path(path)
                            .first_raw()
                            .unwrap_or("application/octet-stream")
                            .to_string(),
                        description,
                        privacy: false,
                        note: String::new(),
                        note_format: NoteFormat::Flowed,
                        attributes: Vec::new(),
                        source_refs: Vec::new(),
                        file_hash: Some(file_hash),
                        change_time: Utc::now().timestamp(),
                    };
                    object.insert(tx)?;
                    object.handle
                }
            };

            owner.media_refs_mut().push(MediaRef::new(handle.clone()));
            owner.set_change_time(Utc::now().timestamp());
            owner.save(tx)?;
            Ok(handle)
        });

        if result.is_err() {
            // The transaction rolled back; drop the in-memory ref too.
            owner.media_refs_mut().truncate(refs_before);
        }
        result
    }

    /// Create a person record with freshly allocated identifiers.
    pub fn create_person(&mut self, name: Name) -> Result<Person> {
        self.grouped("Add Person", |tx| {
            let serial = allocate_serial(tx)?;
            let mut person = Person::new(format!("p{serial:08x}"), format!("I{serial:04}"), name);
            person.change_time = Utc::now().timestamp();
            person.insert(tx)?;
            Ok(person)
        })
    }

    /// Create a family record. Parent handles, when given, must exist.
    pub fn create_family(
        &mut self,
        father: Option<&str>,
        mother: Option<&str>,
    ) -> Result<Family> {
        for handle in [father, mother].into_iter().flatten() {
            if Person::find(&self.db, handle)
                .map_err(ArchiveError::Store)?
                .is_none()
            {
                return Err(ArchiveError::UnknownHandle(handle.to_string()));
            }
        }

        self.grouped("Add Family", |tx| {
            let serial = allocate_serial(tx)?;
            let mut family = Family::new(format!("f{serial:08x}"), format!("F{serial:04}"));
            family.father_handle = father.map(str::to_string);
            family.mother_handle = mother.map(str::to_string);
            family.change_time = Utc::now().timestamp();
            family.insert(tx)?;
            Ok(family)
        })
    }

    fn family_label(&self, family: &Family) -> DbResult<String> {
        let father = match &family.father_handle {
            Some(h) => Person::find(&self.db, h)?.map(|p| p.name.display()),
            None => None,
        };
        let mother = match &family.mother_handle {
            Some(h) => Person::find(&self.db, h)?.map(|p| p.name.display()),
            None => None,
        };
        Ok(match (father, mother) {
            (Some(f), Some(m)) => format!("{f} & {m}"),
            (Some(f), None) => f,
            (None, Some(m)) => m,
            (None, None) => family.id.clone(),
        })
    }
}

/// Allocate the next record serial from the metadata singleton. Only valid
/// inside a transaction.
fn allocate_serial(tx: &Transaction<'_>) -> DbResult<i64> {
    let serial: i64 = query_one(
        tx,
        "SELECT next_serial FROM archive_metadata WHERE id = 1",
        [],
        |row| Ok(row.get(0)?),
    )?;
    tx.execute(
        "UPDATE archive_metadata SET next_serial = ?1 WHERE id = 1",
        [serial + 1],
    )
    .context("failed to advance record serial")?;
    Ok(serial)
}

fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Name;
    use std::io::Write;

    fn service() -> ArchiveService {
        ArchiveService::new(ArchiveDb::in_memory().unwrap())
    }

    fn media(handle: &str, id: &str, path: &str) -> MediaObject {
        MediaObject {
            handle: handle.into(),
            id: id.into(),
            path: path.into(),
            mime_type: "image/jpeg".into(),
            description: String::new(),
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
    fn sweep_strips_refs_and_deletes_object() {
        let mut svc = service();
        media("m1", "O0001", "/media/a.jpg").insert(&svc.db).unwrap();
        media("m2", "O0002", "/media/b.jpg").insert(&svc.db).unwrap();

        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        person.media_refs.push(MediaRef::new("m1"));
        person.media_refs.push(MediaRef::new("m2"));
        person.insert(&svc.db).unwrap();

        let mut family = Family::new("f1", "F0001");
        family.media_refs.push(MediaRef::new("m1"));
        family.insert(&svc.db).unwrap();

        // Source and Place never referenced m1; the sweep must not touch them.
        let mut source = Source::new("s1", "S0001", "Parish register");
        source.media_refs.push(MediaRef::new("m2"));
        source.insert(&svc.db).unwrap();
        Place::new("pl1", "P0001", "Oldtown").insert(&svc.db).unwrap();

        svc.remove_media_object("m1").unwrap();

        assert!(MediaObject::find(&svc.db, "m1").unwrap().is_none());
        let person = Person::load(&svc.db, "p1").unwrap();
        let handles: Vec<_> = person
            .media_refs
            .iter()
            .map(|r| r.media_handle.as_str())
            .collect();
        assert_eq!(handles, ["m2"]);
        assert!(Family::load(&svc.db, "f1").unwrap().media_refs.is_empty());

        let source = Source::load(&svc.db, "s1").unwrap();
        assert_eq!(source.media_refs.len(), 1);
        assert_eq!(source.media_refs[0].media_handle, "m2");
        assert_eq!(source.change_time, 0);
    }

    #[test]
    fn sweep_records_one_undo_entry() {
        let mut svc = service();
        media("m1", "O0001", "/media/a.jpg").insert(&svc.db).unwrap();
        svc.remove_media_object("m1").unwrap();

        let latest = UndoEntry::latest(&svc.db).unwrap().unwrap();
        assert_eq!(latest.label, "Remove Media Object");
        assert_eq!(UndoEntry::load_all(&svc.db).unwrap().len(), 1);
    }

    #[test]
    fn sweep_of_unknown_handle_fails_cleanly() {
        let mut svc = service();
        let err = svc.remove_media_object("missing").unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownHandle(_)));
        assert!(UndoEntry::latest(&svc.db).unwrap().is_none());
    }

    #[test]
    fn references_are_listed_in_class_order() {
        let mut svc = service();
        media("m1", "O0001", "/media/a.jpg").insert(&svc.db).unwrap();

        let mut place = Place::new("pl1", "P0001", "Oldtown church");
        place.media_refs.push(MediaRef::new("m1"));
        place.insert(&svc.db).unwrap();

        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        person.media_refs.push(MediaRef::new("m1"));
        person.insert(&svc.db).unwrap();

        let refs = svc.references_to("m1").unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, HostKind::Person);
        assert_eq!(refs[0].label, "Lovelace, Ada");
        assert_eq!(refs[1].kind, HostKind::Place);
        assert_eq!(refs[1].label, "Oldtown church");

        svc.remove_media_object("m1").unwrap();
        assert!(svc.references_to("m1").unwrap().is_empty());
    }

    #[test]
    fn attach_creates_object_and_reference() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("portrait.jpg");
        std::fs::File::create(&file)
            .unwrap()
            .write_all(b"not really a jpeg")
            .unwrap();

        let mut svc = service();
        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        person.insert(&svc.db).unwrap();

        let handle = svc.attach_media_file(&mut person, &file, None).unwrap();

        let object = MediaObject::load(&svc.db, &handle).unwrap();
        assert_eq!(object.description, "portrait");
        assert_eq!(object.mime_type, "image/jpeg");
        assert!(object.file_hash.is_some());

        let stored = Person::load(&svc.db, "p1").unwrap();
        assert_eq!(stored.media_refs.len(), 1);
        assert_eq!(stored.media_refs[0].media_handle, handle);
    }

    #[test]
    fn attach_dedups_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("portrait.jpg");
        std::fs::write(&file, b"bytes").unwrap();

        let mut svc = service();
        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        person.insert(&svc.db).unwrap();
        let mut family = Family::new("f1", "F0001");
        family.insert(&svc.db).unwrap();

        let first = svc.attach_media_file(&mut person, &file, None).unwrap();
        let second = svc.attach_media_file(&mut family, &file, None).unwrap();

        assert_eq!(first, second);
        assert_eq!(MediaObject::load_all(&svc.db).unwrap().len(), 1);
    }

    #[test]
    fn created_records_get_distinct_identifiers() {
        let mut svc = service();
        let ada = svc.create_person(Name::new("Ada", "Lovelace")).unwrap();
        let william = svc.create_person(Name::new("William", "King")).unwrap();
        assert_ne!(ada.handle, william.handle);
        assert_ne!(ada.id, william.id);

        let family = svc
            .create_family(Some(&william.handle), Some(&ada.handle))
            .unwrap();
        let stored = Family::load(&svc.db, &family.handle).unwrap();
        assert_eq!(stored.father_handle.as_deref(), Some(william.handle.as_str()));

        let err = svc.create_family(Some("missing"), None).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownHandle(_)));
    }

    #[test]
    fn attach_missing_file_changes_nothing() {
        let mut svc = service();
        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        person.insert(&svc.db).unwrap();

        let err = svc
            .attach_media_file(&mut person, Path::new("/no/such/file.jpg"), None)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::FileNotFound(_)));
        assert!(person.media_refs.is_empty());
        assert!(MediaObject::load_all(&svc.db).unwrap().is_empty());
    }
}
