//! Configuration module.
//!
//! - `AppConfig`: where assets, cache, status and logs live, and how the
//!   privileged shell is invoked. Persisted as JSON under the user config dir.
//! - `loader`: file resolution, load/save helpers.
//! - `store`: the persisted driver status and assistant toggles.

pub mod loader;
pub mod store;

pub use store::StatusStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root holding `drivers/<family>/<script>.sh`
    pub assets_dir: PathBuf,
    /// Where scripts are staged before execution
    pub cache_dir: PathBuf,
    /// Persisted driver status file
    pub status_path: PathBuf,
    pub logs_dir: PathBuf,

    /// Binary invoked as `<su_binary> -c "<command>"`
    pub su_binary: String,
    pub reboot_delay_secs: u64,
    /// Bound on waiting for each output drain after the process exits
    pub drain_timeout_ms: u64,

    /// Use the simulated shell instead of `su`
    pub simulate: bool,
    /// Use this kernel release instead of the running kernel's
    pub kernel_version_override: Option<String>,

    pub debug_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("gamecamp"))
            .unwrap_or_else(|| PathBuf::from(".gamecamp"));
        let cache_dir = dirs::cache_dir()
            .map(|d| d.join("gamecamp"))
            .unwrap_or_else(|| data_dir.join("cache"));

        AppConfig {
            assets_dir: data_dir.join("assets"),
            cache_dir,
            status_path: data_dir.join("driver_status.json"),
            logs_dir: data_dir.join("logs"),
            su_binary: "su".to_string(),
            reboot_delay_secs: 3,
            drain_timeout_ms: 5000,
            simulate: false,
            kernel_version_override: None,
            debug_logging: false,
        }
    }
}

impl AppConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Effective log level for the collector.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug_logging {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
