//! Per-window session context.
//!
//! The last-used media directory and the set of open child dialogs are
//! deliberately not process-wide state: they live in an explicit `Session`
//! handed to dialog constructors, with its lifetime tied to the owning
//! window.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use app_settings::AppSettings;

/// Identity of an open property editor, used to surface an existing dialog
/// instead of opening a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditorKey {
    MediaObject(String),
    MediaRef { owner: String, media: String },
}

#[derive(Debug, Default)]
pub struct Session {
    settings: AppSettings,
    open_editors: HashSet<EditorKey>,
}

impl Session {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            open_editors: HashSet::new(),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Hand the settings back for persisting when the window closes.
    pub fn into_settings(self) -> AppSettings {
        self.settings
    }

    pub fn last_media_dir(&self) -> Option<&Path> {
        self.settings.last_media_dir.as_deref()
    }

    pub fn set_last_media_dir(&mut self, dir: impl Into<PathBuf>) {
        self.settings.set_last_media_dir(dir);
    }

    pub fn invalid_date_format(&self) -> &str {
        &self.settings.invalid_date_format
    }

    /// Register an editor as open. Returns `false` when one already exists
    /// for this key; the caller should present the existing dialog.
    pub fn begin_editor(&mut self, key: EditorKey) -> bool {
        self.open_editors.insert(key)
    }

    pub fn end_editor(&mut self, key: &EditorKey) {
        self.open_editors.remove(key);
    }

    pub fn editor_open(&self, key: &EditorKey) -> bool {
        self.open_editors.contains(key)
    }
}
