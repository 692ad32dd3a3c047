//! Image scaling and the on-disk thumbnail cache.
//!
//! Media files themselves are opaque to the rest of the system; this crate
//! is the one place that decodes pixels. Gallery views ask the
//! [`Thumbnailer`] for a cached thumbnail path and fall back to a mime-type
//! icon when decoding fails.

use std::fs;
use std::path::{Path, PathBuf};

use core_types::PreviewImage;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, PreviewError>;

/// Largest edge of a gallery thumbnail, in pixels.
pub const THUMB_SIZE: u32 = 140;

#[derive(Debug, Default)]
pub struct PreviewEngine;

impl PreviewEngine {
    pub fn new() -> Self {
        Self
    }

    /// Load a file and return pixels scaled so neither dimension exceeds
    /// `max_size`.
    pub fn open_preview<P: AsRef<Path>>(&self, path: P, max_size: u32) -> Result<PreviewImage> {
        let path = path.as_ref();
        let dyn_img = image::open(path).map_err(|e| PreviewError::Decode(e.to_string()))?;

        let scaled = dyn_img.thumbnail(max_size, max_size).to_rgba8();
        let (w, h) = scaled.dimensions();
        let data = scaled.into_raw();

        Ok(PreviewImage {
            width: w,
            height: h,
            data,
        })
    }
}

/// Writes scaled thumbnails into a cache directory, keyed by the media
/// file's path so repeated gallery loads hit the disk cache.
#[derive(Debug)]
pub struct Thumbnailer {
    engine: PreviewEngine,
    cache_dir: PathBuf,
}

impl Thumbnailer {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            engine: PreviewEngine::new(),
            cache_dir,
        })
    }

    /// Cache location for a media file's thumbnail.
    pub fn thumb_path(&self, media_path: &Path) -> PathBuf {
        let key = blake3::hash(media_path.to_string_lossy().as_bytes());
        self.cache_dir.join(format!("{}.png", key.to_hex()))
    }

    /// Return the cached thumbnail for a media file, generating it on the
    /// first request.
    pub fn ensure_thumb(&self, media_path: &Path) -> Result<PathBuf> {
        let out = self.thumb_path(media_path);
        if out.is_file() {
            return Ok(out);
        }

        let preview = self.engine.open_preview(media_path, THUMB_SIZE)?;
        image::save_buffer_with_format(
            &out,
            &preview.data,
            preview.width,
            preview.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| PreviewError::Decode(e.to_string()))?;
        debug!(media = %media_path.display(), thumb = %out.display(), "generated thumbnail");
        Ok(out)
    }
}
