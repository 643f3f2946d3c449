//! GameCamp driver loader core
//!
//! Installs and resets kernel-level driver scripts on rooted Android devices.
//! The crate picks the script that matches the running kernel, runs it
//! through the superuser shell while streaming its output into a terminal
//! log, and remembers the outcome.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Result enums, persisted status, log severities, driver catalog
//! - **kernel**: Kernel version matcher and driver script asset store
//! - **system**: Privileged shell abstraction, root detection, device info
//! - **config**: Application configuration and the persisted status store
//! - **orchestrator**: Install/reset sequencer and its state machine
//! - **terminal**: Append-only observable terminal log
//! - **ui**: Screen controllers and terminal rendering

// Core foundational modules
pub mod error;
pub mod models;

// OS abstraction: privileged shell, root checks, device information
pub mod system;

pub mod config;
pub mod kernel;
pub mod terminal;

// Robust, decoupled logging system
pub mod log_collector;

// Install/reset sequencing and operation state
pub mod orchestrator;

pub mod ui;

// Re-export the log crate for macro usage
pub use log;

// Re-export log collector for use throughout the system
pub use log_collector::{LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{AppError, AssetError, ConfigError, SequenceError, ShellError};

pub use models::{
    AssistantSettings, DriverEntry, DriverStatus, InstallResult, LogSeverity, OperationKind,
    ResetResult, TerminalLogEntry, DEFAULT_DRIVER, DRIVER_CATALOG,
};

pub use config::{AppConfig, StatusStore};
pub use kernel::{match_driver_script, AssetProbe, AssetStore, KernelVersion};
pub use orchestrator::{DriverOrchestrator, OperationState, OrchestrationState};
pub use system::{SimulatedShell, SuShell, SystemWrapper};
pub use terminal::TerminalLog;
pub use ui::{DashboardController, DriverController, DriverUiState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_reexport() {
        let err: AppError = ConfigError::FileNotFound("settings.json".into()).into();
        assert!(err.user_message().starts_with("Settings error"));
    }

    #[test]
    fn test_models_reexport() {
        assert!(DRIVER_CATALOG.iter().any(|d| d.name == DEFAULT_DRIVER));
        assert_eq!(LogSeverity::Command.glyph(), "$ ");
    }
}
