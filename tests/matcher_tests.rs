use gamecamp::kernel::matcher::{family_for, is_compatible, match_driver_script, supported_families};
use gamecamp::kernel::AssetStore;
use proptest::prelude::*;
use std::collections::HashSet;
use tempfile::TempDir;

fn probe_of(files: &[&str]) -> impl Fn(&str) -> bool {
    let set: HashSet<String> = files.iter().map(|s| s.to_string()).collect();
    move |name: &str| set.contains(name)
}

#[test]
fn test_gki_kernel_maps_to_family_script() {
    let probe = probe_of(&[]);
    assert_eq!(match_driver_script("5.10.66-gki", &probe).as_deref(), Some("5.10.sh"));
}

#[test]
fn test_highest_existing_revision_wins() {
    let probe = probe_of(&["4.19.191c.sh", "4.19.191b.sh"]);
    assert_eq!(
        match_driver_script("4.19.191-something", &probe).as_deref(),
        Some("4.19.191c.sh")
    );

    let probe = probe_of(&["4.19.191d.sh", "4.19.191c.sh"]);
    assert_eq!(
        match_driver_script("4.19.191-something", &probe).as_deref(),
        Some("4.19.191d.sh")
    );
}

#[test]
fn test_unlettered_when_no_revision_exists() {
    let probe = probe_of(&[]);
    assert_eq!(
        match_driver_script("4.19.157-perf+", &probe).as_deref(),
        Some("4.19.157.sh")
    );
    assert_eq!(match_driver_script("5.4.210", &probe).as_deref(), Some("5.4.sh"));
    let probe = probe_of(&["5.4b.sh"]);
    assert_eq!(match_driver_script("5.4.210", &probe).as_deref(), Some("5.4b.sh"));
}

#[test]
fn test_unknown_patch_falls_back_to_latest_known() {
    let probe = probe_of(&["4.19.191c.sh"]);
    // fallback scripts are used as named, without revision probing
    assert_eq!(match_driver_script("4.19.300", &probe).as_deref(), Some("4.19.191.sh"));
    assert_eq!(match_driver_script("4.14.999", &probe).as_deref(), Some("4.14.186.sh"));
}

#[test]
fn test_patch_substring_uses_full_string() {
    let probe = probe_of(&["4.14.186b.sh"]);
    assert_eq!(
        match_driver_script("4.14.186-perf-g1234", &probe).as_deref(),
        Some("4.14.186b.sh")
    );
    assert_eq!(match_driver_script("4.14.117", &probe).as_deref(), Some("4.14.117.sh"));
}

#[test]
fn test_unsupported_major_is_no_match() {
    let probe = probe_of(&["5.10.sh"]);
    assert_eq!(match_driver_script("3.18.0", &probe), None);
    assert!(!is_compatible("3.18.0"));
    assert_eq!(family_for("3.18.0"), None);
}

#[test]
fn test_most_specific_family_is_checked_first() {
    let families = supported_families();
    assert_eq!(families.first(), Some(&"6.6"));
    assert_eq!(families.last(), Some(&"4.9"));
    assert_eq!(family_for("6.1.57-android14"), Some("6.1"));
    assert_eq!(family_for("6.10.1"), None);
}

#[test]
fn test_matcher_against_asset_store() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("drivers").join("RT-devpro");
    std::fs::create_dir_all(&folder).unwrap();
    for f in ["4.19.191.sh", "4.19.191b.sh", "4.19.191c.sh"] {
        std::fs::write(folder.join(f), "").unwrap();
    }
    let store = AssetStore::new(dir.path());
    let probe = store.probe("RT-devpro");
    assert_eq!(
        match_driver_script("4.19.191-g0a1b2c", &probe).as_deref(),
        Some("4.19.191c.sh")
    );
}

proptest! {
    #[test]
    fn prop_fewer_than_two_segments_is_no_match(s in "[^.]*") {
        let probe = |_: &str| true;
        prop_assert_eq!(match_driver_script(&s, &probe), None);
    }

    #[test]
    fn prop_never_panics(s in ".*") {
        let probe = |_: &str| false;
        let _ = match_driver_script(&s, &probe);
    }

    #[test]
    fn prop_result_is_a_shell_script(major in 0u32..10, minor in 0u32..30, patch in 0u32..400) {
        let probe = |_: &str| false;
        let release = format!("{}.{}.{}-android", major, minor, patch);
        if let Some(script) = match_driver_script(&release, &probe) {
            prop_assert!(script.ends_with(".sh"));
            prop_assert!(is_compatible(&release));
        }
    }
}
