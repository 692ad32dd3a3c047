//! Media object property editor: description, note, attributes, source
//! references, plus a lazily computed list of every record that references
//! the object.

use archive::{ArchiveError, ArchiveService, Backref, MediaObject};
use chrono::Utc;
use core_types::{Attribute, NoteFormat, SourceRef};

use crate::session::{EditorKey, Session};

pub struct ObjectEditor {
    key: EditorKey,
    original: MediaObject,
    /// Working copy; persisted on apply.
    pub object: MediaObject,
    references: Option<Vec<Backref>>,
}

impl ObjectEditor {
    /// Open an editor for the object. Returns `None` when one is already
    /// open for this handle; the shell should present the existing dialog.
    pub fn open(
        session: &mut Session,
        svc: &ArchiveService,
        handle: &str,
    ) -> archive::Result<Option<Self>> {
        let key = EditorKey::MediaObject(handle.to_string());
        if !session.begin_editor(key.clone()) {
            return Ok(None);
        }
        let object = MediaObject::load(&svc.db, handle).map_err(ArchiveError::Store)?;
        Ok(Some(Self {
            key,
            original: object.clone(),
            object,
            references: None,
        }))
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.object.description = description.into();
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.object.note = note.into();
    }

    pub fn set_note_format(&mut self, format: NoteFormat) {
        self.object.note_format = format;
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.object.attributes.push(attribute);
    }

    pub fn update_attribute(&mut self, index: usize, attribute: Attribute) {
        if let Some(slot) = self.object.attributes.get_mut(index) {
            *slot = attribute;
        }
    }

    pub fn delete_attribute(&mut self, index: usize) {
        if index < self.object.attributes.len() {
            self.object.attributes.remove(index);
        }
    }

    pub fn add_source_ref(&mut self, source_ref: SourceRef) {
        self.object.source_refs.push(source_ref);
    }

    pub fn delete_source_ref(&mut self, index: usize) {
        if index < self.object.source_refs.len() {
            self.object.source_refs.remove(index);
        }
    }

    /// Records referencing this object, computed the first time the
    /// references pane is shown and cached for the dialog's lifetime.
    pub fn references(&mut self, svc: &ArchiveService) -> archive::Result<&[Backref]> {
        if self.references.is_none() {
            self.references = Some(svc.references_to(&self.object.handle)?);
        }
        Ok(self.references.as_deref().unwrap_or_default())
    }

    /// Persist pending edits as one undo group and notify the caller's
    /// refresh hook. Nothing is written when the object is unchanged.
    pub fn apply(
        &mut self,
        svc: &mut ArchiveService,
        on_update: Option<&mut dyn FnMut()>,
    ) -> archive::Result<bool> {
        let changed = self.object != self.original;
        if changed {
            self.object.change_time = Utc::now().timestamp();
            svc.commit_media_object("Edit Media Object", &self.object)?;
            self.original = self.object.clone();
        }
        if let Some(update) = on_update {
            update();
        }
        Ok(changed)
    }

    pub fn close(self, session: &mut Session) {
        session.end_editor(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive::{ArchiveDb, HostKind, Person, Place, UndoEntry};
    use core_types::{MediaRef, Name};

    fn fixture() -> ArchiveService {
        let svc = ArchiveService::new(ArchiveDb::in_memory().unwrap());
        MediaObject {
            handle: "m1".into(),
            id: "O0001".into(),
            path: "/media/portrait.jpg".into(),
            mime_type: "image/jpeg".into(),
            description: "portrait".into(),
            privacy: false,
            note: String::new(),
            note_format: NoteFormat::Flowed,
            attributes: Vec::new(),
            source_refs: Vec::new(),
            file_hash: None,
            change_time: 0,
        }
        .insert(&svc.db)
        .unwrap();
        svc
    }

    #[test]
    fn apply_persists_and_notifies() {
        let mut svc = fixture();
        let mut session = Session::default();

        let mut editor = ObjectEditor::open(&mut session, &svc, "m1")
            .unwrap()
            .unwrap();
        editor.set_description("Ada at the engine");
        editor.set_note("from the family album");

        let refreshed = std::cell::Cell::new(0);
        let mut hook = || refreshed.set(refreshed.get() + 1);
        assert!(editor.apply(&mut svc, Some(&mut hook)).unwrap());
        assert_eq!(refreshed.get(), 1);

        let stored = MediaObject::load(&svc.db, "m1").unwrap();
        assert_eq!(stored.description, "Ada at the engine");
        assert_eq!(stored.note, "from the family album");
        assert_eq!(
            UndoEntry::latest(&svc.db).unwrap().unwrap().label,
            "Edit Media Object"
        );

        // A second apply with no further edits writes nothing but still
        // notifies.
        assert!(!editor.apply(&mut svc, Some(&mut hook)).unwrap());
        assert_eq!(refreshed.get(), 2);
        assert_eq!(UndoEntry::load_all(&svc.db).unwrap().len(), 1);
    }

    #[test]
    fn references_are_computed_lazily_and_cached() {
        let svc = fixture();
        let mut session = Session::default();

        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        person.media_refs.push(MediaRef::new("m1"));
        person.insert(&svc.db).unwrap();

        let mut editor = ObjectEditor::open(&mut session, &svc, "m1")
            .unwrap()
            .unwrap();
        let refs = editor.references(&svc).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, HostKind::Person);

        // New referrers appearing later are not picked up by the cached
        // pane; the dialog shows the state at first display.
        let mut place = Place::new("pl1", "P0001", "Oldtown");
        place.media_refs.push(MediaRef::new("m1"));
        place.insert(&svc.db).unwrap();
        assert_eq!(editor.references(&svc).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_editor_is_refused_until_closed() {
        let svc = fixture();
        let mut session = Session::default();

        let first = ObjectEditor::open(&mut session, &svc, "m1").unwrap();
        assert!(first.is_some());
        assert!(ObjectEditor::open(&mut session, &svc, "m1")
            .unwrap()
            .is_none());

        first.unwrap().close(&mut session);
        assert!(ObjectEditor::open(&mut session, &svc, "m1")
            .unwrap()
            .is_some());
    }
}
