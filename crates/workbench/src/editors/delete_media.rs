//! Confirm-flow wrapper around media object deletion.

use archive::ArchiveService;

/// Deletes a media object after the user confirmed, sweeping every record
/// class for dangling references, then runs an optional refresh hook so
/// open views can reload.
pub struct DeleteMediaQuery<'a> {
    media_handle: String,
    on_update: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> DeleteMediaQuery<'a> {
    pub fn new(media_handle: impl Into<String>) -> Self {
        Self {
            media_handle: media_handle.into(),
            on_update: None,
        }
    }

    pub fn with_refresh(mut self, refresh: impl FnMut() + 'a) -> Self {
        self.on_update = Some(Box::new(refresh));
        self
    }

    pub fn execute(mut self, svc: &mut ArchiveService) -> archive::Result<()> {
        svc.remove_media_object(&self.media_handle)?;
        if let Some(refresh) = self.on_update.as_mut() {
            refresh();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive::{ArchiveDb, MediaObject, Person};
    use core_types::{MediaRef, Name, NoteFormat};

    #[test]
    fn refresh_runs_after_a_successful_sweep() {
        let mut svc = ArchiveService::new(ArchiveDb::in_memory().unwrap());
        MediaObject {
            handle: "m1".into(),
            id: "O0001".into(),
            path: "/media/a.jpg".into(),
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
        .insert(&svc.db)
        .unwrap();
        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        person.media_refs.push(MediaRef::new("m1"));
        person.insert(&svc.db).unwrap();

        let mut refreshed = false;
        DeleteMediaQuery::new("m1")
            .with_refresh(|| refreshed = true)
            .execute(&mut svc)
            .unwrap();

        assert!(refreshed);
        assert!(MediaObject::find(&svc.db, "m1").unwrap().is_none());
        assert!(Person::load(&svc.db, "p1").unwrap().media_refs.is_empty());
    }

    #[test]
    fn refresh_does_not_run_when_the_sweep_fails() {
        let mut svc = ArchiveService::new(ArchiveDb::in_memory().unwrap());
        let mut refreshed = false;
        let result = DeleteMediaQuery::new("missing")
            .with_refresh(|| refreshed = true)
            .execute(&mut svc);

        assert!(result.is_err());
        assert!(!refreshed);
    }
}
