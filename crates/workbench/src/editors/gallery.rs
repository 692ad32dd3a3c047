//! Gallery controller: the ordered media list of one owning record.
//!
//! Holds the record being edited and a snapshot of its media list taken at
//! open time; closing with [`CloseAction::Cancel`] restores the snapshot
//! and persists the restore, so removals done in the dialog never survive a
//! cancelled session.

use std::path::{Path, PathBuf};

use archive::{ArchiveError, ArchiveService, MediaHost, MediaObject};
use chrono::Utc;
use core_types::MediaRef;
use preview::Thumbnailer;
use tracing::warn;

use crate::view::{GalleryItem, GalleryView, MediaFetcher, ThumbSource, UiError};

/// Display descriptions longer than this are ellipsized on gallery tiles.
const DESCRIPTION_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    Ok,
    Cancel,
}

/// An intent delivered by the render layer.
#[derive(Debug, Clone)]
pub enum GalleryIntent {
    Select(Option<usize>),
    /// Attach a file from disk, creating or reusing a media object.
    AddFile {
        path: PathBuf,
        description: Option<String>,
    },
    /// Reference a media object that already exists in the archive.
    AddExisting { media_handle: String },
    /// Remove the selected reference from the record; the object stays.
    RemoveSelected,
    /// Drag reorder: move the reference at `from` to `to`. `None` means
    /// the drop had no target position and is ignored.
    MoveRef { from: usize, to: Option<usize> },
    /// Drop of a URI or a bare media handle onto the gallery.
    DropUri {
        uri: String,
        position: Option<usize>,
    },
}

pub struct Gallery<H: MediaHost> {
    host: H,
    snapshot: Vec<MediaRef>,
    selected: Option<usize>,
    in_event: bool,
    lists_changed: bool,
}

impl<H: MediaHost> Gallery<H> {
    pub fn open(
        host: H,
        svc: &ArchiveService,
        thumbs: &Thumbnailer,
        view: &mut impl GalleryView,
    ) -> Self {
        let snapshot = host.media_refs().to_vec();
        let gallery = Self {
            host,
            snapshot,
            selected: None,
            in_event: false,
            lists_changed: false,
        };
        gallery.load_images(svc, thumbs, view);
        gallery
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn lists_changed(&self) -> bool {
        self.lists_changed
    }

    /// Dispatch one intent. Nested dispatch from a view callback is a
    /// no-op: event handling here is strictly non-reentrant.
    pub fn dispatch(
        &mut self,
        intent: GalleryIntent,
        svc: &mut ArchiveService,
        thumbs: &Thumbnailer,
        fetcher: &dyn MediaFetcher,
        view: &mut impl GalleryView,
    ) -> archive::Result<()> {
        if self.in_event {
            return Ok(());
        }
        self.in_event = true;
        let out = self.handle_intent(intent, svc, thumbs, fetcher, view);
        self.in_event = false;
        out
    }

    fn handle_intent(
        &mut self,
        intent: GalleryIntent,
        svc: &mut ArchiveService,
        thumbs: &Thumbnailer,
        fetcher: &dyn MediaFetcher,
        view: &mut impl GalleryView,
    ) -> archive::Result<()> {
        match intent {
            GalleryIntent::Select(index) => {
                self.selected = index.filter(|i| *i < self.host.media_refs().len());
            }
            GalleryIntent::AddFile { path, description } => {
                self.attach_file(&path, description.as_deref(), svc, view)?;
                self.load_images(svc, thumbs, view);
            }
            GalleryIntent::AddExisting { media_handle } => {
                if MediaObject::find(&svc.db, &media_handle)
                    .map_err(ArchiveError::Store)?
                    .is_some()
                {
                    self.host.media_refs_mut().push(MediaRef::new(media_handle));
                    self.lists_changed = true;
                    self.load_images(svc, thumbs, view);
                }
            }
            GalleryIntent::RemoveSelected => {
                if let Some(index) = self.selected.take() {
                    if index < self.host.media_refs().len() {
                        self.host.media_refs_mut().remove(index);
                        self.lists_changed = true;
                    }
                    self.load_images(svc, thumbs, view);
                }
            }
            GalleryIntent::MoveRef { from, to } => {
                if self.move_ref(from, to) {
                    self.load_images(svc, thumbs, view);
                }
            }
            GalleryIntent::DropUri { uri, position } => {
                self.drop_uri(&uri, position, svc, fetcher, view)?;
                self.load_images(svc, thumbs, view);
            }
        }
        Ok(())
    }

    /// Close the dialog. Cancel restores the media list captured at open
    /// time and persists the restore as its own undo group.
    pub fn close(mut self, action: CloseAction, svc: &mut ArchiveService) -> archive::Result<H> {
        match action {
            CloseAction::Ok => {
                if self.lists_changed {
                    self.host.set_change_time(Utc::now().timestamp());
                    svc.commit_host("Edit Media Object", &self.host)?;
                }
            }
            CloseAction::Cancel => {
                self.host.set_media_refs(self.snapshot.clone());
                svc.commit_host("Edit Media Object", &self.host)?;
            }
        }
        Ok(self.host)
    }

    /// Rebuild the view's tile list from the current media references.
    pub fn load_images(
        &self,
        svc: &ArchiveService,
        thumbs: &Thumbnailer,
        view: &mut impl GalleryView,
    ) {
        let mut items = Vec::new();
        for media_ref in self.host.media_refs() {
            match MediaObject::find(&svc.db, &media_ref.media_handle) {
                Ok(Some(object)) => {
                    let thumb = match thumbs.ensure_thumb(Path::new(&object.path)) {
                        Ok(path) => ThumbSource::File(path),
                        Err(err) => {
                            view.show_error(&UiError::new(
                                format!("Thumbnail for {} could not be found", object.path),
                                err.to_string(),
                            ));
                            ThumbSource::MimeIcon(object.mime_type.clone())
                        }
                    };
                    items.push(GalleryItem {
                        media_handle: media_ref.media_handle.clone(),
                        description: ellipsize(&object.description, DESCRIPTION_LIMIT),
                        thumb,
                    });
                }
                Ok(None) => {
                    warn!(handle = %media_ref.media_handle, "media reference points nowhere");
                }
                Err(err) => {
                    view.show_error(&UiError::new(
                        "Media object could not be loaded",
                        err.to_string(),
                    ));
                }
            }
        }
        view.refresh(&items);
        view.set_has_media(!self.host.media_refs().is_empty());
    }

    fn attach_file(
        &mut self,
        path: &Path,
        description: Option<&str>,
        svc: &mut ArchiveService,
        view: &mut impl GalleryView,
    ) -> archive::Result<()> {
        match svc.attach_media_file(&mut self.host, path, description) {
            Ok(_) => {
                self.lists_changed = true;
                Ok(())
            }
            Err(ArchiveError::FileNotFound(missing)) => {
                view.show_error(&UiError::new(
                    format!("Cannot import {}", missing.display()),
                    "The filename supplied could not be found.",
                ));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn move_ref(&mut self, from: usize, to: Option<usize>) -> bool {
        let Some(to) = to else {
            return false;
        };
        let refs = self.host.media_refs_mut();
        if from >= refs.len() || to == from {
            return false;
        }
        let item = refs.remove(from);
        let to = to.min(refs.len());
        refs.insert(to, item);
        self.lists_changed = true;
        true
    }

    fn drop_uri(
        &mut self,
        uri: &str,
        position: Option<usize>,
        svc: &mut ArchiveService,
        fetcher: &dyn MediaFetcher,
        view: &mut impl GalleryView,
    ) -> archive::Result<()> {
        if let Some(local) = uri.strip_prefix("file://") {
            return self.attach_file(Path::new(local), None, svc, view);
        }

        if uri.contains("://") {
            // Remote media: fetch first, attach only on success. A failed
            // fetch must leave both the record and the media table as they
            // were.
            return match fetcher.fetch(uri) {
                Ok(local) => self.attach_file(&local, Some(uri), svc, view),
                Err(err) => {
                    view.show_error(&UiError::new(
                        format!("Could not import {uri}"),
                        err.to_string(),
                    ));
                    Ok(())
                }
            };
        }

        // A bare handle: dropping a reference the record already holds
        // reorders it; a known object gains a new reference; anything else
        // is ignored.
        if let Some(from) = self
            .host
            .media_refs()
            .iter()
            .position(|r| r.media_handle == uri)
        {
            self.move_ref(from, position);
        } else if MediaObject::find(&svc.db, uri)
            .map_err(ArchiveError::Store)?
            .is_some()
        {
            self.host.media_refs_mut().push(MediaRef::new(uri));
            self.lists_changed = true;
        }
        Ok(())
    }
}

fn ellipsize(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let truncated: String = text.chars().take(limit).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive::{ArchiveDb, Person};
    use core_types::{Name, NoteFormat};
    use std::io;

    #[derive(Default)]
    struct RecordingView {
        items: Vec<GalleryItem>,
        has_media: bool,
        errors: Vec<UiError>,
    }

    impl GalleryView for RecordingView {
        fn refresh(&mut self, items: &[GalleryItem]) {
            self.items = items.to_vec();
        }

        fn set_has_media(&mut self, any: bool) {
            self.has_media = any;
        }

        fn show_error(&mut self, error: &UiError) {
            self.errors.push(error.clone());
        }
    }

    struct FailingFetcher;

    impl MediaFetcher for FailingFetcher {
        fn fetch(&self, _url: &str) -> io::Result<PathBuf> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "connection timed out"))
        }
    }

    struct LocalFetcher(PathBuf);

    impl MediaFetcher for LocalFetcher {
        fn fetch(&self, _url: &str) -> io::Result<PathBuf> {
            Ok(self.0.clone())
        }
    }

    fn media(handle: &str, id: &str, path: &str, description: &str) -> MediaObject {
        MediaObject {
            handle: handle.into(),
            id: id.into(),
            path: path.into(),
            mime_type: "image/jpeg".into(),
            description: description.into(),
            privacy: false,
            note: String::new(),
            note_format: NoteFormat::Flowed,
            attributes: Vec::new(),
            source_refs: Vec::new(),
            file_hash: None,
            change_time: 0,
        }
    }

    fn fixture() -> (ArchiveService, Thumbnailer, RecordingView, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let svc = ArchiveService::new(ArchiveDb::in_memory().unwrap());
        let thumbs = Thumbnailer::new(dir.path().join("thumbs")).unwrap();
        (svc, thumbs, RecordingView::default(), dir)
    }

    fn person_with_refs(svc: &ArchiveService, handles: &[&str]) -> Person {
        let mut person = Person::new("p1", "I0001", Name::new("Ada", "Lovelace"));
        for h in handles {
            person.media_refs.push(MediaRef::new(*h));
        }
        person.insert(&svc.db).unwrap();
        person
    }

    #[test]
    fn failed_thumbnail_falls_back_to_mime_icon() {
        let (svc, thumbs, mut view, _dir) = fixture();
        media("m1", "O0001", "/no/such/file.jpg", "a very long description indeed")
            .insert(&svc.db)
            .unwrap();
        let person = person_with_refs(&svc, &["m1"]);

        let _gallery = Gallery::open(person, &svc, &thumbs, &mut view);

        assert_eq!(view.items.len(), 1);
        assert!(matches!(view.items[0].thumb, ThumbSource::MimeIcon(_)));
        assert_eq!(view.items[0].description, "a very long descript...");
        assert_eq!(view.errors.len(), 1);
        assert!(view.has_media);
    }

    #[test]
    fn remove_selected_only_drops_the_reference() {
        let (mut svc, thumbs, mut view, _dir) = fixture();
        media("m1", "O0001", "/x.jpg", "x").insert(&svc.db).unwrap();
        media("m2", "O0002", "/y.jpg", "y").insert(&svc.db).unwrap();
        let person = person_with_refs(&svc, &["m1", "m2"]);

        let mut gallery = Gallery::open(person, &svc, &thumbs, &mut view);
        gallery
            .dispatch(
                GalleryIntent::Select(Some(0)),
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();
        gallery
            .dispatch(
                GalleryIntent::RemoveSelected,
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();

        let person = gallery.close(CloseAction::Ok, &mut svc).unwrap();
        assert_eq!(person.media_refs.len(), 1);
        assert_eq!(person.media_refs[0].media_handle, "m2");
        // The objects themselves are untouched.
        assert!(MediaObject::find(&svc.db, "m1").unwrap().is_some());

        let stored = Person::load(&svc.db, "p1").unwrap();
        assert_eq!(stored.media_refs.len(), 1);
    }

    #[test]
    fn cancel_restores_the_snapshot() {
        let (mut svc, thumbs, mut view, _dir) = fixture();
        media("m1", "O0001", "/x.jpg", "x").insert(&svc.db).unwrap();
        media("m2", "O0002", "/y.jpg", "y").insert(&svc.db).unwrap();
        let person = person_with_refs(&svc, &["m1", "m2"]);

        let mut gallery = Gallery::open(person, &svc, &thumbs, &mut view);
        gallery
            .dispatch(
                GalleryIntent::Select(Some(1)),
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();
        gallery
            .dispatch(
                GalleryIntent::RemoveSelected,
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();

        let person = gallery.close(CloseAction::Cancel, &mut svc).unwrap();
        let handles: Vec<_> = person
            .media_refs
            .iter()
            .map(|r| r.media_handle.as_str())
            .collect();
        assert_eq!(handles, ["m1", "m2"]);
        assert_eq!(Person::load(&svc.db, "p1").unwrap().media_refs.len(), 2);
    }

    #[test]
    fn dropping_a_held_handle_reorders_instead_of_duplicating() {
        let (mut svc, thumbs, mut view, _dir) = fixture();
        media("m1", "O0001", "/x.jpg", "x").insert(&svc.db).unwrap();
        media("m2", "O0002", "/y.jpg", "y").insert(&svc.db).unwrap();
        media("m3", "O0003", "/z.jpg", "z").insert(&svc.db).unwrap();
        let person = person_with_refs(&svc, &["m1", "m2", "m3"]);

        let mut gallery = Gallery::open(person, &svc, &thumbs, &mut view);
        gallery
            .dispatch(
                GalleryIntent::DropUri {
                    uri: "m3".into(),
                    position: Some(0),
                },
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();

        let handles: Vec<_> = gallery
            .host()
            .media_refs
            .iter()
            .map(|r| r.media_handle.as_str())
            .collect();
        assert_eq!(handles, ["m3", "m1", "m2"]);

        // Dropping onto its own slot, or with no target, changes nothing.
        for position in [Some(0), None] {
            gallery
                .dispatch(
                    GalleryIntent::DropUri {
                        uri: "m3".into(),
                        position,
                    },
                    &mut svc,
                    &thumbs,
                    &FailingFetcher,
                    &mut view,
                )
                .unwrap();
        }
        assert_eq!(gallery.host().media_refs.len(), 3);
        assert_eq!(gallery.host().media_refs[0].media_handle, "m3");
    }

    #[test]
    fn failed_remote_fetch_aborts_without_partial_state() {
        let (mut svc, thumbs, mut view, _dir) = fixture();
        let person = person_with_refs(&svc, &[]);

        let mut gallery = Gallery::open(person, &svc, &thumbs, &mut view);
        gallery
            .dispatch(
                GalleryIntent::DropUri {
                    uri: "https://example.org/photo.jpg".into(),
                    position: None,
                },
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();

        assert_eq!(view.errors.len(), 1);
        assert!(view.errors[0].title.contains("Could not import"));
        assert!(gallery.host().media_refs.is_empty());
        assert!(MediaObject::load_all(&svc.db).unwrap().is_empty());
        assert!(!gallery.lists_changed());
    }

    #[test]
    fn successful_remote_fetch_attaches_the_local_copy() {
        let (mut svc, thumbs, mut view, dir) = fixture();
        let local = dir.path().join("fetched.jpg");
        std::fs::write(&local, b"bytes").unwrap();
        let person = person_with_refs(&svc, &[]);

        let mut gallery = Gallery::open(person, &svc, &thumbs, &mut view);
        gallery
            .dispatch(
                GalleryIntent::DropUri {
                    uri: "https://example.org/photo.jpg".into(),
                    position: None,
                },
                &mut svc,
                &thumbs,
                &LocalFetcher(local),
                &mut view,
            )
            .unwrap();

        assert_eq!(gallery.host().media_refs.len(), 1);
        let objects = MediaObject::load_all(&svc.db).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].description, "https://example.org/photo.jpg");
    }

    #[test]
    fn nested_dispatch_is_ignored() {
        let (mut svc, thumbs, mut view, _dir) = fixture();
        media("m1", "O0001", "/x.jpg", "x").insert(&svc.db).unwrap();
        let person = person_with_refs(&svc, &["m1"]);

        let mut gallery = Gallery::open(person, &svc, &thumbs, &mut view);
        gallery.in_event = true;
        gallery
            .dispatch(
                GalleryIntent::RemoveSelected,
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();
        assert_eq!(gallery.host().media_refs.len(), 1);

        gallery.in_event = false;
        gallery
            .dispatch(
                GalleryIntent::Select(Some(0)),
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();
        gallery
            .dispatch(
                GalleryIntent::RemoveSelected,
                &mut svc,
                &thumbs,
                &FailingFetcher,
                &mut view,
            )
            .unwrap();
        assert!(gallery.host().media_refs.is_empty());
    }
}
