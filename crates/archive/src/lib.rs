pub mod db;
pub mod schema;
pub mod services;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use db::{
    ArchiveDb, Event, Family, HostKind, MediaHost, MediaObject, Person, Place, Source, Tag,
    UndoEntry,
};
pub use services::{ArchiveService, Backref};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("no record with handle {0}")]
    UnknownHandle(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Filesystem path of an archive, normalized to carry the expected
/// extension so double-clicking and recent-file lists stay consistent.
#[derive(Debug, Clone)]
pub struct ArchivePath(PathBuf);

impl ArchivePath {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let mut normalized = path.as_ref().to_path_buf();
        if normalized
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| {
                ext.eq_ignore_ascii_case("kindredarchive") || ext.eq_ignore_ascii_case("sqlite")
            })
            .is_none()
        {
            normalized.set_extension("kindredarchive");
        }
        Self(normalized)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}
