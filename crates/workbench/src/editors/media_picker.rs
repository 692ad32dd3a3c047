//! Add-media dialog logic: preview the chosen file and suggest a
//! description before attaching it to a record.

use std::path::{Path, PathBuf};

use archive::{ArchiveError, ArchiveService, MediaHost};
use preview::{PreviewEngine, THUMB_SIZE};

use crate::session::Session;
use crate::view::{MediaPickerView, PickerPreview, UiError};

pub struct MediaPicker {
    description: String,
    /// Last description this dialog filled in on its own. User-typed text
    /// never matches it and is therefore never clobbered.
    temp_name: String,
}

impl MediaPicker {
    /// Open the picker. Returns the directory the file chooser should start
    /// in, when a previous session left one behind.
    pub fn open(session: &Session) -> (Self, Option<PathBuf>) {
        let initial_dir = session
            .last_media_dir()
            .filter(|dir| dir.is_dir())
            .map(Path::to_path_buf);
        (
            Self {
                description: String::new(),
                temp_name: String::new(),
            },
            initial_dir,
        )
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The user edited the description by hand.
    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    /// The chosen filename changed: refresh the preview and, unless the
    /// user already typed something, suggest the file stem as description.
    pub fn file_changed(
        &mut self,
        path: &Path,
        engine: &PreviewEngine,
        view: &mut impl MediaPickerView,
    ) {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        if self.description.is_empty() || self.description == self.temp_name {
            self.description = stem.clone();
            view.set_description(&stem);
        }
        self.temp_name = stem;

        if !path.is_file() {
            return;
        }
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        if mime.starts_with("image") {
            match engine.open_preview(path, THUMB_SIZE) {
                Ok(image) => view.set_preview(&PickerPreview::Image(image)),
                Err(_) => view.set_preview(&PickerPreview::MimeIcon(mime)),
            }
        } else {
            view.set_preview(&PickerPreview::MimeIcon(mime));
        }
    }

    /// Attach the chosen file to the owning record. Returns the media
    /// handle, or `None` when the failure was reported to the user.
    pub fn confirm<H: MediaHost>(
        &self,
        path: &Path,
        session: &mut Session,
        svc: &mut ArchiveService,
        owner: &mut H,
        view: &mut impl MediaPickerView,
    ) -> archive::Result<Option<String>> {
        let description = Some(self.description.as_str()).filter(|d| !d.is_empty());
        match svc.attach_media_file(owner, path, description) {
            Ok(handle) => {
                if let Some(parent) = path.parent() {
                    session.set_last_media_dir(parent);
                }
                Ok(Some(handle))
            }
            Err(ArchiveError::FileNotFound(missing)) => {
                view.show_error(&UiError::new(
                    format!("Cannot import {}", missing.display()),
                    "The filename supplied could not be found.",
                ));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
