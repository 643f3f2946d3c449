//! Unified error type hierarchy for GameCamp
//!
//! Provides structured error handling with ConfigError, AssetError, ShellError,
//! SequenceError, and AppError. Front ends show `AppError::user_message`.

use std::io;
use thiserror::Error;

/// Configuration and status store errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Driver asset lookup and staging errors.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Driver script not found: {0}")]
    NotFound(String),

    #[error("Invalid driver script name: {0}")]
    InvalidName(String),

    #[error("Failed to stage driver script: {0}")]
    StagingFailed(String),

    #[error("IO error during asset operations: {0}")]
    IoError(#[from] io::Error),
}

/// Privileged shell execution errors.
///
/// A nonzero exit code is NOT a `ShellError`; it is reported through the
/// returned exit code. These variants cover a command that could not be run.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Failed to wait for '{program}': {reason}")]
    WaitFailed { program: String, reason: String },

    #[error("Failed to capture {0}")]
    StreamUnavailable(&'static str),

    #[error("Process terminated by signal")]
    Signalled,
}

/// Sequencer gating errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Another driver operation is already running")]
    Busy,

    #[error("Invalid operation transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Global error type with user-facing messages.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// OS command failed (su, getprop, uname, reboot)
    #[error("Command '{cmd}' failed: {reason}")]
    OsCommand { cmd: String, reason: String },

    /// File I/O error (read/write/delete)
    #[error("I/O error: {0}")]
    Io(String),

    /// Settings persist or deserialize error
    #[error("Settings error: {0}")]
    Settings(String),

    /// Invalid input (e.g., driver name with shell chars)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Get a user-facing error message suitable for UI display
    pub fn user_message(&self) -> String {
        match self {
            AppError::OsCommand { cmd, reason } => {
                format!("Failed to execute '{}': {}", cmd, reason)
            }
            AppError::Io(msg) => format!("File operation failed: {}", msg),
            AppError::Settings(msg) => format!("Settings error: {}", msg),
            AppError::InvalidInput(msg) => format!("Invalid input: {}", msg),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Settings(e.to_string())
    }
}

impl From<ShellError> for AppError {
    fn from(e: ShellError) -> Self {
        match e {
            ShellError::SpawnFailed { program, reason } | ShellError::WaitFailed { program, reason } => {
                AppError::OsCommand { cmd: program, reason }
            }
            other => AppError::OsCommand {
                cmd: "shell".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::FileNotFound("/data/settings.json".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /data/settings.json"
        );
    }

    #[test]
    fn test_shell_error_converts_to_os_command() {
        let err: AppError = ShellError::SpawnFailed {
            program: "su".to_string(),
            reason: "No such file or directory".to_string(),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Failed to execute 'su': No such file or directory"
        );
    }

    #[test]
    fn test_sequence_error_display() {
        assert_eq!(
            SequenceError::Busy.to_string(),
            "Another driver operation is already running"
        );
    }

    #[test]
    fn test_config_and_io_errors_map_to_user_messages() {
        let err: AppError = ConfigError::ValidationFailed("bad path".to_string()).into();
        assert_eq!(
            err.user_message(),
            "Settings error: Configuration validation failed: bad path"
        );

        let err: AppError = io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed").into();
        assert_eq!(err.user_message(), "File operation failed: stdin closed");
    }
}
