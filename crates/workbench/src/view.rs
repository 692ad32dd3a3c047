//! Capability traits implemented by the render layer.

use std::io;
use std::path::PathBuf;

use core_types::PreviewImage;

/// User-facing failure delivered to a dialog, never printed by controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub title: String,
    pub detail: String,
}

impl UiError {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }
}

/// Where a gallery tile's picture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbSource {
    /// Cached thumbnail on disk.
    File(PathBuf),
    /// Decoding failed or the file is not an image; show the icon for this
    /// mime type instead.
    MimeIcon(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub media_handle: String,
    pub description: String,
    pub thumb: ThumbSource,
}

pub trait GalleryView {
    fn refresh(&mut self, items: &[GalleryItem]);
    /// Whether the owning record currently has any media attached; shells
    /// use this to emphasize the gallery tab label.
    fn set_has_media(&mut self, any: bool);
    fn show_error(&mut self, error: &UiError);
}

#[derive(Debug, Clone)]
pub enum PickerPreview {
    Image(PreviewImage),
    MimeIcon(String),
}

pub trait MediaPickerView {
    fn set_preview(&mut self, preview: &PickerPreview);
    fn set_description(&mut self, text: &str);
    fn show_error(&mut self, error: &UiError);
}

/// Retrieves a remote media URL into a local file. Supplied by the shell;
/// a failed fetch aborts the drop with no partial state change.
pub trait MediaFetcher {
    fn fetch(&self, url: &str) -> io::Result<PathBuf>;
}
