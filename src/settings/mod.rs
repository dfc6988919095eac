pub mod schema;

use std::{
    collections::BTreeSet,
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::{NotepadError, Result};
use schema::{MIN_FONT_SIZE, Settings};

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
    pending_write: bool,
}

impl SettingsStore {
    pub fn load() -> Self {
        Self::with_path(settings_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = load_settings_from(path.as_path());
        Self {
            path,
            settings,
            pending_write: false,
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut Settings),
    {
        mutator(&mut self.settings);
        self.pending_write = true;
    }

    pub fn has_pending_write(&self) -> bool {
        self.pending_write
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.pending_write {
            save_settings_to(self.path.as_path(), &self.settings)?;
            self.pending_write = false;
        }
        Ok(())
    }
}

pub fn settings_path() -> PathBuf {
    if let Some(root) = portable_root() {
        return root.join("settings.json");
    }

    if let Some(base) = dirs::config_dir() {
        base.join("Notepad").join("settings.json")
    } else {
        PathBuf::from("settings.json")
    }
}

pub fn portable_root() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.to_path_buf();
    if dir.join("notepad.ini").exists() {
        Some(dir)
    } else {
        None
    }
}

pub fn load_settings_from(path: &Path) -> Settings {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(error) => {
            debug!(path = %path.display(), %error, "no settings file, using defaults");
            return Settings::default();
        }
    };

    match serde_json::from_str::<Settings>(&data) {
        Ok(settings) => settings.migrate(),
        Err(error) => {
            warn!(path = %path.display(), %error, "malformed settings file, using defaults");
            Settings::default()
        }
    }
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| NotepadError::io(parent, e))?;
    }
    let data = serde_json::to_string_pretty(&settings.clone().migrate())?;
    fs::write(path, data).map_err(|e| NotepadError::io(path, e))
}

/// Immutable configuration handed to the inserter, save dispatch and format controls.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub image_extensions: BTreeSet<String>,
    pub html_extensions: BTreeSet<String>,
    pub font_sizes: RangeInclusive<u32>,
    pub default_font_family: String,
    pub default_font_size: f32,
    pub default_wrap: bool,
}

impl EditorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let settings = settings.clone().migrate();
        Self {
            image_extensions: settings.files.image_extensions.into_iter().collect(),
            html_extensions: settings.files.html_extensions.into_iter().collect(),
            font_sizes: MIN_FONT_SIZE..=settings.editor.max_font_size,
            default_font_family: settings.editor.default_font_family,
            default_font_size: settings.editor.default_font_size,
            default_wrap: settings.editor.word_wrap,
        }
    }

    /// `ext` is a lowercase extension with its leading dot, e.g. `".png"`.
    pub fn is_image_extension(&self, ext: &str) -> bool {
        self.image_extensions.contains(ext)
    }

    pub fn is_html_extension(&self, ext: &str) -> bool {
        self.html_extensions.contains(ext)
    }

    pub fn font_size_labels(&self) -> Vec<String> {
        self.font_sizes.clone().map(|size| size.to_string()).collect()
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_known_extensions() {
        let config = EditorConfig::default();
        for ext in [".jpg", ".png", ".bmp"] {
            assert!(config.is_image_extension(ext));
        }
        assert!(!config.is_image_extension(".gif"));
        assert!(config.is_html_extension(".htm"));
        assert!(config.is_html_extension(".html"));
        assert!(!config.is_html_extension(".txt"));
        assert_eq!(config.font_sizes, 1..=288);
        assert_eq!(config.font_size_labels().len(), 288);
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let mut store = SettingsStore::with_path(&path);
        assert_eq!(store.settings(), &Settings::default());
        store.update(|s| s.editor.word_wrap = false);
        assert!(store.has_pending_write());
        store.flush().expect("flush");
        assert!(!store.has_pending_write());

        let reloaded = SettingsStore::with_path(&path);
        assert!(!reloaded.settings().editor.word_wrap);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");

        assert_eq!(load_settings_from(&path), Settings::default());
    }
}
