// Settings Store
// Persists console settings as pretty-printed JSON under the data directory

use crate::models::{ConsoleSettings, SettingsPatch};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Failure persisting or restoring settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loads, caches, and saves [`ConsoleSettings`]. The first load seeds the
/// settings file with defaults; an unreadable file falls back to defaults
/// in memory and is only rewritten on the next save.
pub struct SettingsStore {
    settings_path: PathBuf,
    cache: RwLock<Option<ConsoleSettings>>,
}

impl SettingsStore {
    /// Create a store rooted at the given data directory
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
            cache: RwLock::new(None),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from cache or disk, creating the file with defaults
    /// when it does not exist yet
    pub fn load(&self) -> Result<ConsoleSettings, SettingsError> {
        if let Ok(cache) = self.cache.read() {
            if let Some(ref settings) = *cache {
                return Ok(settings.clone());
            }
        }

        let settings = if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            match serde_json::from_str::<ConsoleSettings>(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    // Keep the broken file around for inspection; the next
                    // save will replace it
                    log::warn!("Settings file is unreadable, using defaults: {}", e);
                    ConsoleSettings::default()
                }
            }
        } else {
            let defaults = ConsoleSettings::default();
            self.save_internal(&defaults)?;
            defaults
        };

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(settings.clone());
        }

        Ok(settings)
    }

    /// Apply a partial update and persist the result. Patches that change
    /// nothing skip the disk write. Returns the settings now in effect.
    pub fn update(&self, patch: &SettingsPatch) -> Result<ConsoleSettings, SettingsError> {
        let mut settings = self.load()?;

        if patch.apply(&mut settings) {
            self.save(&settings)?;
        }

        Ok(settings)
    }

    /// Replace the stored settings wholesale
    pub fn save(&self, settings: &ConsoleSettings) -> Result<(), SettingsError> {
        self.save_internal(settings)?;

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(settings.clone());
        }

        Ok(())
    }

    fn save_internal(&self, settings: &ConsoleSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.settings_path, content)?;
        Ok(())
    }

    /// Drop the cached settings and delete the file, returning the defaults
    /// now in effect
    pub fn reset(&self) -> Result<ConsoleSettings, SettingsError> {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }

        if self.settings_path.exists() {
            std::fs::remove_file(&self.settings_path)?;
        }

        Ok(ConsoleSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreamingPatch;

    #[test]
    fn test_first_load_seeds_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().to_path_buf());

        let settings = store.load().unwrap();
        assert_eq!(settings, ConsoleSettings::default());
        assert!(store.settings_path().exists());
    }

    #[test]
    fn test_update_persists_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().to_path_buf());

        let patch = SettingsPatch {
            streaming: Some(StreamingPatch {
                fps: Some(60),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = store.update(&patch).unwrap();
        assert_eq!(updated.streaming.fps, 60);

        // A fresh store reading the same directory sees the change
        let reopened = SettingsStore::new(dir.path().to_path_buf());
        assert_eq!(reopened.load().unwrap().streaming.fps, 60);
    }

    #[test]
    fn test_unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().to_path_buf());
        std::fs::write(store.settings_path(), "{not valid json").unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings, ConsoleSettings::default());

        // The broken file is untouched until something is saved
        let on_disk = std::fs::read_to_string(store.settings_path()).unwrap();
        assert_eq!(on_disk, "{not valid json");
    }

    #[test]
    fn test_reset_deletes_file_and_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().to_path_buf());

        let patch = SettingsPatch {
            streaming: Some(StreamingPatch {
                max_concurrent_streams: Some(9),
                ..Default::default()
            }),
            ..Default::default()
        };
        store.update(&patch).unwrap();

        let settings = store.reset().unwrap();
        assert_eq!(settings, ConsoleSettings::default());
        assert!(!store.settings_path().exists());

        // The next load starts over from defaults
        assert_eq!(store.load().unwrap(), ConsoleSettings::default());
    }

    #[test]
    fn test_unchanged_patch_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().to_path_buf());
        store.load().unwrap();
        std::fs::remove_file(store.settings_path()).unwrap();

        // Patching in the value already in effect writes nothing
        let patch = SettingsPatch {
            streaming: Some(StreamingPatch {
                fps: Some(30),
                ..Default::default()
            }),
            ..Default::default()
        };
        store.update(&patch).unwrap();
        assert!(!store.settings_path().exists());
    }
}
