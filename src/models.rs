//! Core data types for GameCamp.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Driver that is selected when nothing has been persisted yet.
pub const DEFAULT_DRIVER: &str = "RTpro";

/// Terminal outcome of an install sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallResult {
    Success,
    Error(String),
}

impl InstallResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InstallResult::Success)
    }
}

/// Terminal outcome of a reset sequence.
///
/// `RebootFailed` is distinct from `Error`: the persisted status has already
/// been cleared when it is produced, so the user only has to reboot by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetResult {
    Success,
    NoRootPermission,
    RebootFailed,
    Error(String),
}

impl ResetResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ResetResult::Success)
    }
}

/// Persisted driver status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverStatus {
    pub driver_installed: bool,
    pub selected_driver: String,
    /// Epoch millis of the last successful install, 0 when never installed
    pub install_time: i64,
}

impl Default for DriverStatus {
    fn default() -> Self {
        DriverStatus {
            driver_installed: false,
            selected_driver: DEFAULT_DRIVER.to_string(),
            install_time: 0,
        }
    }
}

impl DriverStatus {
    /// Install time rendered in local time, if the driver was ever installed.
    pub fn install_time_display(&self) -> Option<String> {
        if self.install_time <= 0 {
            return None;
        }
        let dt: DateTime<Local> = Local.timestamp_millis_opt(self.install_time).single()?;
        Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// Game assistant behaviour toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub anti_screen_recording: bool,
    pub no_background_mode: bool,
    pub single_transparent_mode: bool,
}

/// Severity of a terminal log line.
///
/// Purely presentational: each severity carries a display color and an
/// optional line prefix glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogSeverity {
    Success,
    Error,
    Warning,
    Info,
    Command,
    Progress,
}

impl LogSeverity {
    /// Line prefix shown before the text.
    pub fn glyph(&self) -> &'static str {
        match self {
            LogSeverity::Command => "$ ",
            LogSeverity::Success => "✓ ",
            LogSeverity::Error => "✗ ",
            LogSeverity::Warning => "⚠ ",
            LogSeverity::Progress => "⟳ ",
            LogSeverity::Info => "",
        }
    }

    /// Display color as 0xRRGGBB.
    pub fn color(&self) -> u32 {
        match self {
            LogSeverity::Success => 0x00FF00,
            LogSeverity::Error => 0xFF0000,
            LogSeverity::Warning => 0xFFFF00,
            LogSeverity::Info => 0xFFFFFF,
            LogSeverity::Command => 0x00FFFF,
            LogSeverity::Progress => 0x0080FF,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogSeverity::Success => "success",
            LogSeverity::Error => "error",
            LogSeverity::Warning => "warning",
            LogSeverity::Info => "info",
            LogSeverity::Command => "command",
            LogSeverity::Progress => "progress",
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the terminal log shown during a privileged operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalLogEntry {
    pub text: String,
    pub severity: LogSeverity,
    /// `[HH:MM:SS]`
    pub timestamp: String,
    pub is_command: bool,
}

impl TerminalLogEntry {
    pub fn new(text: impl Into<String>, severity: LogSeverity) -> Self {
        TerminalLogEntry {
            text: text.into(),
            severity,
            timestamp: Local::now().format("[%H:%M:%S]").to_string(),
            is_command: severity == LogSeverity::Command,
        }
    }

    /// Full rendered line: timestamp, glyph, text.
    pub fn render(&self) -> String {
        format!("{} {}{}", self.timestamp, self.severity.glyph(), self.text)
    }
}

/// Catalog entry for a user-selectable driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverEntry {
    pub name: &'static str,
    pub description: &'static str,
    /// Folder under `drivers/`; `None` for drivers that are not shipped yet
    pub folder: Option<&'static str>,
    pub recommended: bool,
}

impl DriverEntry {
    pub fn display_name(&self) -> String {
        if self.recommended {
            format!("{} (recommended)", self.name)
        } else {
            self.name.to_string()
        }
    }

    pub fn is_available(&self) -> bool {
        self.folder.is_some()
    }
}

/// All drivers offered for selection.
pub const DRIVER_CATALOG: &[DriverEntry] = &[
    DriverEntry {
        name: "RTpro",
        description: "Recommended driver, best compatibility across 4.x-6.x kernels",
        folder: Some("RT-devpro"),
        recommended: true,
    },
    DriverEntry {
        name: "FL",
        description: "General purpose driver for most devices",
        folder: None,
        recommended: false,
    },
    DriverEntry {
        name: "FT",
        description: "High performance driver for high-end devices",
        folder: None,
        recommended: false,
    },
    DriverEntry {
        name: "QX11.4",
        description: "Latest QX release, full feature set",
        folder: None,
        recommended: false,
    },
    DriverEntry {
        name: "QX10",
        description: "Stable QX release, balanced performance",
        folder: None,
        recommended: false,
    },
    DriverEntry {
        name: "QX8",
        description: "Lightweight QX release, low resource usage",
        folder: None,
        recommended: false,
    },
];

/// Look up a catalog entry by its user-facing name.
pub fn find_driver(name: &str) -> Option<&'static DriverEntry> {
    DRIVER_CATALOG.iter().find(|d| d.name == name)
}

/// Asset folder for a driver name, if the driver is shipped.
pub fn driver_folder(name: &str) -> Option<&'static str> {
    find_driver(name).and_then(|d| d.folder)
}

/// Which privileged flow an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Install,
    Reset,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Install => write!(f, "install"),
            OperationKind::Reset => write!(f, "reset"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status() {
        let status = DriverStatus::default();
        assert!(!status.driver_installed);
        assert_eq!(status.selected_driver, DEFAULT_DRIVER);
        assert!(status.install_time_display().is_none());
    }

    #[test]
    fn test_catalog_default_driver_is_available() {
        let entry = find_driver(DEFAULT_DRIVER).expect("default driver in catalog");
        assert!(entry.is_available());
        assert_eq!(driver_folder("RTpro"), Some("RT-devpro"));
        assert_eq!(driver_folder("QX8"), None);
        assert_eq!(driver_folder("nonexistent"), None);
    }

    #[test]
    fn test_log_entry_render_uses_glyph() {
        let entry = TerminalLogEntry::new("sh /tmp/5.10.sh", LogSeverity::Command);
        assert!(entry.is_command);
        assert!(entry.render().ends_with("$ sh /tmp/5.10.sh"));

        let info = TerminalLogEntry::new("plain", LogSeverity::Info);
        assert!(!info.is_command);
        assert!(info.render().ends_with(" plain"));
    }

    #[test]
    fn test_status_deserializes_partial_json() {
        let status: DriverStatus = serde_json::from_str(r#"{"driver_installed": true}"#).unwrap();
        assert!(status.driver_installed);
        assert_eq!(status.selected_driver, DEFAULT_DRIVER);
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Install.to_string(), "install");
        assert_eq!(OperationKind::Reset.to_string(), "reset");
    }
}
