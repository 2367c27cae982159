//! Persistent user settings.
//!
//! Settings live in a small JSON file under the user's roaming config
//! directory. Loading never fails the application: a missing or corrupt file
//! yields defaults. Saving writes a temp file and renames it into place.

use crate::hotkey::{HotKey, HotkeyBinding};
use directories::BaseDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const APP_DIR: &str = "MicMute";
const SETTINGS_FILE: &str = "settings.json";

/// Settings error types.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SettingsError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// User-editable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppSettings {
    #[serde(rename = "HotKey")]
    pub hotkey: Option<HotKey>,

    #[serde(deserialize_with = "existing_sound")]
    pub mute_sound_path: Option<PathBuf>,

    #[serde(deserialize_with = "existing_sound")]
    pub unmute_sound_path: Option<PathBuf>,

    /// Start hidden in the tray.
    pub start_minimized: bool,

    /// Hide to the tray instead of exiting when the window is closed.
    pub close_to_tray: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            hotkey: None,
            mute_sound_path: None,
            unmute_sound_path: None,
            start_minimized: false,
            close_to_tray: true,
        }
    }
}

impl AppSettings {
    pub fn hotkey(&self) -> HotkeyBinding {
        self.hotkey.map(HotkeyBinding::from).unwrap_or_default()
    }

    pub fn set_hotkey(&mut self, binding: HotkeyBinding) {
        self.hotkey = binding.to_hotkey();
    }

    pub fn clear_hotkey(&mut self) {
        self.hotkey = None;
    }

    /// Set the sound played on mute. A path that does not exist is refused
    /// and leaves the current value alone; `None` clears it.
    pub fn set_mute_sound(&mut self, path: Option<PathBuf>) -> bool {
        accept_sound(&mut self.mute_sound_path, path)
    }

    /// Unmute counterpart of [`set_mute_sound`](Self::set_mute_sound).
    pub fn set_unmute_sound(&mut self, path: Option<PathBuf>) -> bool {
        accept_sound(&mut self.unmute_sound_path, path)
    }

    /// Whether the window starts hidden, given the `--show` flag.
    pub fn should_start_minimized(&self, show_requested: bool) -> bool {
        self.start_minimized && !show_requested
    }
}

fn accept_sound(slot: &mut Option<PathBuf>, path: Option<PathBuf>) -> bool {
    match path {
        None => {
            *slot = None;
            true
        }
        Some(path) if path.is_file() => {
            *slot = Some(path);
            true
        }
        Some(path) => {
            warn!(path = ?path, "Ignoring sound file that does not exist");
            false
        }
    }
}

/// Sound paths from the file go through the same existence check as the
/// setters, so a deleted file loads as "no sound".
fn existing_sound<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut slot = None;
    accept_sound(&mut slot, Option::<PathBuf>::deserialize(deserializer)?);
    Ok(slot)
}

/// Location of the settings file on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/MicMute/settings.json` for the current user.
    pub fn default_location() -> Result<Self, SettingsError> {
        let dirs = BaseDirs::new().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::new(dirs.config_dir().join(APP_DIR).join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings, falling back to defaults on any problem.
    pub fn load(&self) -> AppSettings {
        match self.try_load() {
            Ok(Some(settings)) => {
                info!(path = ?self.path, "Settings loaded");
                settings
            }
            Ok(None) => {
                debug!(path = ?self.path, "No settings file, using defaults");
                AppSettings::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                AppSettings::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<AppSettings>, SettingsError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| SettingsError::io(&self.path, e))?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Write settings atomically, creating the directory if needed.
    pub fn save(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| SettingsError::io(dir, e))?;
        }

        let contents = serde_json::to_string_pretty(settings)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut temp_file =
            fs::File::create(&temp_path).map_err(|e| SettingsError::io(&temp_path, e))?;
        temp_file
            .write_all(contents.as_bytes())
            .and_then(|()| temp_file.sync_all())
            .map_err(|e| SettingsError::io(&temp_path, e))?;
        drop(temp_file);

        fs::rename(&temp_path, &self.path).map_err(|e| SettingsError::io(&self.path, e))?;

        debug!(path = ?self.path, "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{Code, Modifiers};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("MicMute").join("settings.json"))
    }

    #[test]
    fn defaults_have_no_hotkey_and_close_to_tray() {
        let settings = AppSettings::default();

        assert!(!settings.hotkey().is_set());
        assert!(settings.close_to_tray);
        assert!(!settings.start_minimized);
        assert_eq!(settings.mute_sound_path, None);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();

        assert_eq!(store_in(&dir).load(), AppSettings::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load(), AppSettings::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut settings = AppSettings::default();
        settings.set_hotkey(HotkeyBinding::new(
            Modifiers::CONTROL | Modifiers::ALT,
            Code::KeyM,
        ));
        settings.start_minimized = true;
        settings.close_to_tray = false;

        store.save(&settings).unwrap();

        assert_eq!(store.load(), settings);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn file_uses_readable_field_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut settings = AppSettings::default();
        settings.set_hotkey(HotkeyBinding::new(Modifiers::CONTROL, Code::KeyM));

        store.save(&settings).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();

        assert!(text.contains("\"HotKey\""));
        assert!(text.contains("\"MuteSoundPath\": null"));
        assert!(text.contains("\"CloseToTray\": true"));
    }

    #[test]
    fn cleared_hotkey_round_trips_as_unset() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut settings = AppSettings::default();
        settings.set_hotkey(HotkeyBinding::new(Modifiers::SHIFT, Code::F9));
        settings.clear_hotkey();

        store.save(&settings).unwrap();

        assert!(!store.load().hotkey().is_set());
    }

    #[test]
    fn legacy_hotkey_fields_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let legacy = r#"{ "HotKeyKey": 57, "HotKeyModifiers": 2, "CloseToTray": false }"#;
        fs::write(store.path(), legacy).unwrap();

        let settings = store.load();

        assert!(!settings.hotkey().is_set());
        assert!(!settings.close_to_tray);
    }

    #[test]
    fn deleted_sound_files_load_as_no_sound() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let kept = dir.path().join("unmute.wav");
        fs::write(&kept, b"RIFF").unwrap();
        let gone = dir.path().join("deleted.wav");
        let json = serde_json::json!({
            "MuteSoundPath": gone,
            "UnmuteSoundPath": kept,
            "StartMinimized": true,
        });
        fs::write(store.path(), json.to_string()).unwrap();

        let settings = store.load();

        assert_eq!(settings.mute_sound_path, None);
        assert_eq!(settings.unmute_sound_path, Some(kept));
        assert!(settings.start_minimized);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{ "StartMinimized": true }"#).unwrap();

        let settings = store.load();

        assert!(settings.start_minimized);
        assert!(settings.close_to_tray);
    }

    #[test]
    fn missing_sound_file_is_refused() {
        let dir = TempDir::new().unwrap();
        let mut settings = AppSettings::default();

        assert!(!settings.set_mute_sound(Some(dir.path().join("nope.wav"))));
        assert_eq!(settings.mute_sound_path, None);
    }

    #[test]
    fn existing_sound_file_is_accepted_and_can_be_cleared() {
        let dir = TempDir::new().unwrap();
        let wav = dir.path().join("beep.wav");
        fs::write(&wav, b"RIFF").unwrap();
        let mut settings = AppSettings::default();

        assert!(settings.set_unmute_sound(Some(wav.clone())));
        assert_eq!(settings.unmute_sound_path, Some(wav));

        assert!(settings.set_unmute_sound(None));
        assert_eq!(settings.unmute_sound_path, None);
    }

    #[test]
    fn show_flag_overrides_start_minimized() {
        let mut settings = AppSettings::default();
        assert!(!settings.should_start_minimized(false));

        settings.start_minimized = true;
        assert!(settings.should_start_minimized(false));
        assert!(!settings.should_start_minimized(true));
    }
}
