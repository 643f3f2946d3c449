//! Passive root detection.
//!
//! These checks only look for signs of a rooted device. Whether `su` actually
//! grants access is decided by [`SystemWrapper::has_root`](super::SystemWrapper::has_root).

use super::process::{capture_output, getprop};
use std::path::Path;

/// Locations where su binaries or manager apps are usually installed.
pub const SU_PATHS: &[&str] = &[
    "/system/app/Superuser.apk",
    "/sbin/su",
    "/system/bin/su",
    "/system/xbin/su",
    "/data/local/xbin/su",
    "/data/local/bin/su",
    "/system/sd/xbin/su",
    "/system/bin/failsafe/su",
    "/data/local/su",
    "/su/bin/su",
];

/// Individual findings of the passive checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootReport {
    pub test_keys: bool,
    pub su_paths: Vec<String>,
    pub which_su: Option<String>,
    pub euid_root: bool,
}

impl RootReport {
    pub fn is_rooted(&self) -> bool {
        self.test_keys || !self.su_paths.is_empty() || self.which_su.is_some() || self.euid_root
    }
}

/// Run every passive check.
pub async fn inspect() -> RootReport {
    let test_keys = getprop("ro.build.tags")
        .await
        .map(|tags| tags.contains("test-keys"))
        .unwrap_or(false);

    let su_paths = existing_paths(SU_PATHS);

    let which_su = capture_output("which", &["su"])
        .await
        .filter(|path| !path.is_empty());

    let euid_root = nix::unistd::geteuid().is_root();

    let report = RootReport {
        test_keys,
        su_paths,
        which_su,
        euid_root,
    };
    log::debug!("[Root] {:?}", report);
    report
}

/// Whether the device shows any sign of being rooted.
pub async fn is_rooted() -> bool {
    inspect().await.is_rooted()
}

fn existing_paths(candidates: &[&str]) -> Vec<String> {
    candidates
        .iter()
        .filter(|p| Path::new(p).exists())
        .map(|p| p.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_any_signal_counts() {
        assert!(!RootReport::default().is_rooted());
        assert!(RootReport { test_keys: true, ..Default::default() }.is_rooted());
        assert!(RootReport { which_su: Some("/sbin/su".into()), ..Default::default() }.is_rooted());
        assert!(RootReport { su_paths: vec!["/su/bin/su".into()], ..Default::default() }.is_rooted());
    }

    #[test]
    fn test_existing_paths_filters() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("su");
        std::fs::write(&present, "").unwrap();
        let present = present.to_string_lossy().to_string();

        let found = existing_paths(&[present.as_str(), "/nonexistent/su"]);
        assert_eq!(found, vec![present]);
    }

    #[tokio::test]
    async fn test_inspect_matches_euid() {
        let report = inspect().await;
        assert_eq!(report.euid_root, nix::unistd::geteuid().is_root());
    }
}
