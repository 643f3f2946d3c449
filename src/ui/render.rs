//! Terminal rendering for the command-line front end.

use crate::models::{DriverEntry, DriverStatus, LogSeverity, TerminalLogEntry};
use crate::system::info::InfoSection;
use owo_colors::OwoColorize;

fn rgb(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    )
}

/// `[HH:MM:SS] <glyph><text>`, colored by severity when `color` is set.
pub fn format_entry(entry: &TerminalLogEntry, color: bool) -> String {
    if !color {
        return entry.render();
    }
    let body = format!("{}{}", entry.severity.glyph(), entry.text);
    let (r, g, b) = rgb(entry.severity.color());
    let body = if entry.severity == LogSeverity::Command {
        body.truecolor(r, g, b).bold().to_string()
    } else {
        body.truecolor(r, g, b).to_string()
    };
    format!("{} {}", entry.timestamp.dimmed(), body)
}

pub fn format_section(section: &InfoSection) -> String {
    let width = section
        .entries
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = format!("{}\n", section.title.bold().cyan());
    for (key, value) in &section.entries {
        out.push_str(&format!("  {:<width$}  {}\n", key, value, width = width));
    }
    out
}

pub fn format_status(status: &DriverStatus) -> String {
    let state = if status.driver_installed {
        "installed".green().to_string()
    } else {
        "not installed".yellow().to_string()
    };
    let mut out = format!("Driver:          {}\n", state);
    out.push_str(&format!("Selected driver: {}\n", status.selected_driver));
    if let Some(when) = status.install_time_display() {
        out.push_str(&format!("Installed at:    {}\n", when));
    }
    out
}

pub fn format_driver(entry: &DriverEntry, scripts: &[String]) -> String {
    let availability = if entry.is_available() {
        "[available]".green().to_string()
    } else {
        "[not available yet]".dimmed().to_string()
    };
    let mut out = format!("{} {}\n    {}\n", entry.display_name().bold(), availability, entry.description);
    if !scripts.is_empty() {
        out.push_str(&format!("    scripts: {}\n", scripts.join(", ")));
    }
    out
}

pub fn display_entry(entry: &TerminalLogEntry) {
    println!("{}", format_entry(entry, true));
}

pub fn display_success(message: &str) {
    println!("[OK] {}", message.green());
}

pub fn display_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_entry_has_glyph() {
        let entry = TerminalLogEntry::new("Driver file prepared", LogSeverity::Success);
        let line = format_entry(&entry, false);
        assert!(line.ends_with("✓ Driver file prepared"));
        assert!(line.starts_with('['));
    }

    #[test]
    fn test_colored_entry_keeps_text() {
        let entry = TerminalLogEntry::new("sh /cache/5.10.sh", LogSeverity::Command);
        assert!(format_entry(&entry, true).contains("$ sh /cache/5.10.sh"));
    }

    #[test]
    fn test_rgb_split() {
        assert_eq!(rgb(0x4caf50), (0x4c, 0xaf, 0x50));
    }

    #[test]
    fn test_section_lists_entries() {
        let section = InfoSection {
            title: "Kernel",
            entries: vec![("Kernel version".into(), "5.10.66".into())],
        };
        let text = format_section(&section);
        assert!(text.contains("Kernel version"));
        assert!(text.contains("5.10.66"));
    }
}
