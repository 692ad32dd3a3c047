//! Media reference editor: the per-record view of one attached object.
//!
//! Edits the reference's own privacy flag, note and attribute list without
//! touching the referenced object. The referenced object is loaded for
//! display (path, mime type, public id) only.

use archive::{ArchiveError, ArchiveService, MediaHost, MediaObject};
use chrono::Utc;
use core_types::{Attribute, MediaRef, NoteFormat, SourceRef};

use crate::session::{EditorKey, Session};

pub struct RefEditor {
    key: EditorKey,
    index: usize,
    /// Working copy; the owner's list is only touched on apply.
    pub media_ref: MediaRef,
    /// Referenced object, read-only context for the dialog.
    pub object: MediaObject,
}

impl RefEditor {
    /// Open an editor for the owner's reference at `index`. Returns `None`
    /// when one is already open for this reference; the shell should
    /// present the existing dialog instead of stacking a second one.
    pub fn open(
        session: &mut Session,
        svc: &ArchiveService,
        owner: &impl MediaHost,
        index: usize,
    ) -> archive::Result<Option<Self>> {
        let media_ref = owner
            .media_refs()
            .get(index)
            .cloned()
            .ok_or_else(|| {
                ArchiveError::UnknownHandle(format!("{} media #{index}", owner.handle()))
            })?;
        let key = EditorKey::MediaRef {
            owner: owner.handle().to_string(),
            media: media_ref.media_handle.clone(),
        };
        if !session.begin_editor(key.clone()) {
            return Ok(None);
        }
        let object =
            MediaObject::load(&svc.db, &media_ref.media_handle).map_err(ArchiveError::Store)?;
        Ok(Some(Self {
            key,
            index,
            media_ref,
            object,
        }))
    }

    pub fn set_privacy(&mut self, privacy: bool) {
        self.media_ref.privacy = privacy;
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.media_ref.note = note.into();
    }

    pub fn set_note_format(&mut self, format: NoteFormat) {
        self.media_ref.note_format = format;
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.media_ref.attributes.push(attribute);
    }

    pub fn update_attribute(&mut self, index: usize, attribute: Attribute) {
        if let Some(slot) = self.media_ref.attributes.get_mut(index) {
            *slot = attribute;
        }
    }

    pub fn delete_attribute(&mut self, index: usize) {
        if index < self.media_ref.attributes.len() {
            self.media_ref.attributes.remove(index);
        }
    }

    pub fn add_source_ref(&mut self, source_ref: SourceRef) {
        self.media_ref.source_refs.push(source_ref);
    }

    pub fn delete_source_ref(&mut self, index: usize) {
        if index < self.media_ref.source_refs.len() {
            self.media_ref.source_refs.remove(index);
        }
    }

    /// Write the working copy back onto the owner and persist it as one
    /// undo group. Nothing is written when the reference is unchanged.
    /// Returns whether a change was persisted.
    pub fn apply<H: MediaHost>(
        &mut self,
        svc: &mut ArchiveService,
        owner: &mut H,
    ) -> archive::Result<bool> {
        let changed = match owner.media_refs().get(self.index) {
            Some(current) => *current != self.media_ref,
            None => {
                return Err(ArchiveError::UnknownHandle(format!(
                    "{} media #{}",
                    owner.handle(),
                    self.index
                )))
            }
        };
        if changed {
            owner.media_refs_mut()[self.index] = self.media_ref.clone();
            owner.set_change_time(Utc::now().timestamp());
            svc.commit_host("Edit Media Object", owner)?;
        }
        Ok(changed)
    }

    pub fn close(self, session: &mut Session) {
        session.end_editor(&self.key);
    }
}
