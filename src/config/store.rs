//! Persisted driver status and assistant toggles.
//!
//! One JSON document:
//!
//! ```json
//! {
//!   "driver_installed": true,
//!   "selected_driver": "RTpro",
//!   "install_time": 1718000000000,
//!   "anti_screen_recording": false,
//!   "no_background_mode": false,
//!   "single_transparent_mode": false
//! }
//! ```
//!
//! Every mutation is written through immediately. Writers are the sequencer
//! (on terminal results only) and the assistant settings command.

use crate::error::ConfigError;
use crate::models::{AssistantSettings, DriverStatus, DEFAULT_DRIVER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct StoredState {
    #[serde(flatten)]
    status: DriverStatus,
    #[serde(flatten)]
    assistant: AssistantSettings,
}

pub struct StatusStore {
    /// `None` keeps state in memory only
    path: Option<PathBuf>,
    state: Mutex<StoredState>,
}

impl StatusStore {
    /// Open the store at `path`, starting from defaults when the file does
    /// not exist yet or cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<StoredState>(&content) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "[Store] Unreadable status file {}, starting from defaults: {}",
                        path.display(),
                        e
                    );
                    StoredState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredState::default(),
            Err(e) => return Err(ConfigError::IoError(e)),
        };

        Ok(StatusStore {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// In-memory store, nothing is written to disk.
    pub fn ephemeral() -> Self {
        StatusStore {
            path: None,
            state: Mutex::new(StoredState::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, StoredState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update<F>(&self, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut StoredState),
    {
        let mut state = self.lock();
        let mut next = state.clone();
        f(&mut next);
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn persist(&self, state: &StoredState) -> Result<(), ConfigError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(state)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn status(&self) -> DriverStatus {
        self.lock().status.clone()
    }

    pub fn is_driver_installed(&self) -> bool {
        self.lock().status.driver_installed
    }

    /// Marking as installed also stamps the install time.
    pub fn set_driver_installed(&self, installed: bool) -> Result<(), ConfigError> {
        self.update(|s| {
            s.status.driver_installed = installed;
            if installed {
                s.status.install_time = chrono::Utc::now().timestamp_millis();
            }
        })
    }

    pub fn selected_driver(&self) -> String {
        self.lock().status.selected_driver.clone()
    }

    pub fn set_selected_driver(&self, name: &str) -> Result<(), ConfigError> {
        self.update(|s| s.status.selected_driver = name.to_string())
    }

    /// Epoch millis, 0 if never installed.
    pub fn install_time(&self) -> i64 {
        self.lock().status.install_time
    }

    /// Record a verified install of `driver` in one write.
    pub fn record_install(&self, driver: &str) -> Result<(), ConfigError> {
        self.update(|s| {
            s.status.driver_installed = true;
            s.status.selected_driver = driver.to_string();
            s.status.install_time = chrono::Utc::now().timestamp_millis();
        })
    }

    /// Clear everything, assistant toggles included, back to defaults.
    pub fn reset(&self) -> Result<(), ConfigError> {
        self.update(|s| {
            *s = StoredState::default();
            s.status.driver_installed = false;
            s.status.selected_driver = DEFAULT_DRIVER.to_string();
        })
    }

    pub fn assistant_settings(&self) -> AssistantSettings {
        self.lock().assistant
    }

    pub fn save_assistant_settings(&self, settings: AssistantSettings) -> Result<(), ConfigError> {
        self.update(|s| s.assistant = settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = StatusStore::open(dir.path().join("status.json")).unwrap();
        assert!(!store.is_driver_installed());
        assert_eq!(store.selected_driver(), DEFAULT_DRIVER);
        assert_eq!(store.install_time(), 0);
        assert_eq!(store.assistant_settings(), AssistantSettings::default());
    }

    #[test]
    fn test_record_install_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        {
            let store = StatusStore::open(&path).unwrap();
            store.record_install("RTpro").unwrap();
        }
        let reopened = StatusStore::open(&path).unwrap();
        assert!(reopened.is_driver_installed());
        assert_eq!(reopened.selected_driver(), "RTpro");
        assert!(reopened.install_time() > 0);
    }

    #[test]
    fn test_set_installed_false_keeps_time() {
        let store = StatusStore::ephemeral();
        store.set_driver_installed(true).unwrap();
        let stamped = store.install_time();
        assert!(stamped > 0);
        store.set_driver_installed(false).unwrap();
        assert_eq!(store.install_time(), stamped);
    }

    #[test]
    fn test_reset_clears_assistant_settings() {
        let store = StatusStore::ephemeral();
        store.record_install("RTpro").unwrap();
        store
            .save_assistant_settings(AssistantSettings {
                anti_screen_recording: true,
                no_background_mode: true,
                single_transparent_mode: false,
            })
            .unwrap();

        store.reset().unwrap();
        assert!(!store.is_driver_installed());
        assert_eq!(store.install_time(), 0);
        assert_eq!(store.assistant_settings(), AssistantSettings::default());
    }

    #[test]
    fn test_flat_json_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        let store = StatusStore::open(&path).unwrap();
        store.set_selected_driver("FL").unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["selected_driver"], "FL");
        assert_eq!(json["driver_installed"], false);
        assert_eq!(json["anti_screen_recording"], false);
    }

    #[test]
    fn test_corrupt_file_starts_from_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        fs::write(&path, "garbage").unwrap();
        let store = StatusStore::open(&path).unwrap();
        assert!(!store.is_driver_installed());
    }
}
