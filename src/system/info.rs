//! Device information shown on the dashboard.
//!
//! Every lookup degrades to a placeholder value on failure; nothing here
//! returns an error.

use super::process::{capture_output, getprop};
use super::{capture_privileged, SystemWrapper};
use sysinfo::System;

pub const UNAVAILABLE: &str = "Unavailable";
const BUILD_INFO_MAX: usize = 50;
const GIB: u64 = 1024 * 1024 * 1024;

/// Ordered key/value section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoSection {
    pub title: &'static str,
    pub entries: Vec<(String, String)>,
}

impl InfoSection {
    fn new(title: &'static str) -> Self {
        InfoSection {
            title,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.entries.push((key.to_string(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Load all four sections concurrently, in display order.
pub async fn load_all(system: &dyn SystemWrapper) -> Vec<InfoSection> {
    let (kernel, selinux, device, fingerprint) = tokio::join!(
        kernel_info(system),
        selinux_info(system),
        device_info(),
        fingerprint_info()
    );
    vec![kernel, selinux, device, fingerprint]
}

pub async fn kernel_info(system: &dyn SystemWrapper) -> InfoSection {
    let mut section = InfoSection::new("Kernel");
    section.push("Kernel version", system.kernel_release());
    section.push("CPU architecture", std::env::consts::ARCH);
    let build = capture_output("uname", &["-v"])
        .await
        .map(|v| truncate_build_info(&v))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    section.push("Build info", build);
    section
}

pub async fn selinux_info(system: &dyn SystemWrapper) -> InfoSection {
    let mut section = InfoSection::new("SELinux");
    if !system.has_root().await {
        section.push("SELinux status", "Root required");
        section.push("Hint", "Grant root access to view the full status");
        section.push("Note", "SELinux details need system-level access");
        return section;
    }

    let status = match capture_privileged(system, "cat /sys/fs/selinux/enforce").await {
        Ok(raw) if !raw.is_empty() => describe_enforce(&raw),
        _ => match capture_privileged(system, "getenforce").await {
            Ok(raw) => describe_getenforce(&raw),
            Err(e) => {
                log::debug!("[Info] getenforce failed: {}", e);
                "Unknown".to_string()
            }
        },
    };

    let policy = capture_privileged(system, "cat /sys/fs/selinux/policyvers")
        .await
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    section.push("Security level", security_level(&status));
    section.entries.insert(0, ("SELinux status".to_string(), status));
    section.entries.insert(1, ("Policy version".to_string(), policy));
    section
}

pub async fn device_info() -> InfoSection {
    let mut section = InfoSection::new("Device");

    let manufacturer = getprop("ro.product.manufacturer").await;
    let model = getprop("ro.product.model").await;
    let model = match (manufacturer, model) {
        (Some(m), Some(n)) => format!("{} {}", m, n),
        (None, Some(n)) => n,
        (Some(m), None) => m,
        (None, None) => UNAVAILABLE.to_string(),
    };
    section.push("Model", model);

    let version = match (
        getprop("ro.build.version.release").await,
        getprop("ro.build.version.sdk").await,
    ) {
        (Some(release), Some(sdk)) => format!("Android {} (API {})", release, sdk),
        (Some(release), None) => format!("Android {}", release),
        _ => std::env::consts::OS.to_string(),
    };
    section.push("System version", version);

    section.push("Memory", memory_usage());
    section.push("Storage", storage_usage());
    section.push("Hardware", prop_or(getprop("ro.hardware").await));
    section.push(
        "Security patch",
        prop_or(getprop("ro.build.version.security_patch").await),
    );
    section
}

pub async fn fingerprint_info() -> InfoSection {
    let mut section = InfoSection::new("Fingerprint");
    section.push("Fingerprint", prop_or(getprop("ro.build.fingerprint").await));
    section.push("Build ID", prop_or(getprop("ro.build.id").await));
    let build_time = getprop("ro.build.date.utc")
        .await
        .and_then(|secs| format_build_time(&secs))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    section.push("Build time", build_time);
    section.push(
        "Security patch",
        prop_or(getprop("ro.build.version.security_patch").await),
    );
    section
}

fn prop_or(value: Option<String>) -> String {
    value.unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn memory_usage() -> String {
    let mut sys = System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    if total == 0 {
        return UNAVAILABLE.to_string();
    }
    let used = total.saturating_sub(sys.available_memory());
    format_gb(used, total)
}

fn storage_usage() -> String {
    let target = if std::path::Path::new("/data").exists() {
        "/data"
    } else {
        "/"
    };
    match nix::sys::statvfs::statvfs(target) {
        Ok(stat) => {
            let frag = stat.fragment_size() as u64;
            let total = stat.blocks() as u64 * frag;
            let available = stat.blocks_available() as u64 * frag;
            format_gb(total.saturating_sub(available), total)
        }
        Err(e) => {
            log::debug!("[Info] statvfs {} failed: {}", target, e);
            UNAVAILABLE.to_string()
        }
    }
}

pub fn format_gb(used_bytes: u64, total_bytes: u64) -> String {
    format!("{}GB / {}GB", used_bytes / GIB, total_bytes / GIB)
}

pub fn truncate_build_info(raw: &str) -> String {
    let raw = raw.trim();
    if raw.chars().count() > BUILD_INFO_MAX {
        let head: String = raw.chars().take(BUILD_INFO_MAX).collect();
        format!("{}...", head)
    } else {
        raw.to_string()
    }
}

/// `/sys/fs/selinux/enforce` content.
pub fn describe_enforce(raw: &str) -> String {
    match raw.trim() {
        "1" => "Enforcing".to_string(),
        "0" => "Permissive".to_string(),
        _ => "Unknown".to_string(),
    }
}

/// `getenforce` output.
pub fn describe_getenforce(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "enforcing" => "Enforcing".to_string(),
        "permissive" => "Permissive".to_string(),
        "disabled" => "Disabled".to_string(),
        "" => "Unknown".to_string(),
        _ => raw.trim().to_string(),
    }
}

pub fn security_level(status: &str) -> &'static str {
    match status {
        "Enforcing" => "High",
        "Permissive" => "Relaxed",
        "Disabled" => "Disabled",
        _ => "Unknown",
    }
}

/// Format `ro.build.date.utc` (epoch seconds) in local time.
pub fn format_build_time(epoch_secs: &str) -> Option<String> {
    let secs: i64 = epoch_secs.trim().parse().ok()?;
    let utc = chrono::DateTime::from_timestamp(secs, 0)?;
    Some(
        utc.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}
