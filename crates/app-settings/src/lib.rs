use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_RECENT: usize = 5;

/// Template applied when a projected date fails validation. `{}` is
/// replaced with the raw display string.
pub const DEFAULT_INVALID_DATE_FORMAT: &str = "<s>{}</s>";

#[derive(Debug, Error)]
pub enum AppSettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings path unavailable")]
    MissingSettingsPath,
}

pub type Result<T> = std::result::Result<T, AppSettingsError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub last_archive: Option<PathBuf>,
    #[serde(default)]
    pub recent_archives: Vec<PathBuf>,
    /// Directory the last media file was attached from. Dialog sessions
    /// seed their file chooser here.
    #[serde(default)]
    pub last_media_dir: Option<PathBuf>,
    #[serde(default = "default_invalid_date_format")]
    pub invalid_date_format: String,
}

fn default_invalid_date_format() -> String {
    DEFAULT_INVALID_DATE_FORMAT.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            last_archive: None,
            recent_archives: Vec::new(),
            last_media_dir: None,
            invalid_date_format: default_invalid_date_format(),
        }
    }
}

impl AppSettings {
    pub fn load() -> Result<Self> {
        Self::load_from(settings_file_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(settings_file_path()?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(AppSettings::default())
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    /// Record an archive as most recently used, keeping the recent list
    /// bounded and free of duplicates.
    pub fn record_archive(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.last_archive = Some(path.clone());
        self.recent_archives.retain(|existing| existing != &path);
        self.recent_archives.insert(0, path);
        if self.recent_archives.len() > MAX_RECENT {
            self.recent_archives.truncate(MAX_RECENT);
        }
    }

    pub fn set_last_media_dir(&mut self, dir: impl Into<PathBuf>) {
        self.last_media_dir = Some(dir.into());
    }
}

fn settings_file_path() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().ok_or(AppSettingsError::MissingSettingsPath)?;
    let mut path = base.config_dir().to_path_buf();
    path.push("kindred");
    std::fs::create_dir_all(&path)?;
    path.push("settings.json");
    Ok(path)
}
