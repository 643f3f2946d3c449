//! Kernel version to driver script matching.
//!
//! Maps a raw kernel release string (e.g. `5.10.123-android12-9-g1a2b3c`) to
//! the name of the install script shipped for that kernel family.
//!
//! Matching rules:
//! - The release must have at least two dot-separated components; anything
//!   after a `-` in the minor component is ignored for family selection.
//! - Families are checked from most to least specific and the first family
//!   whose `major.minor` equals the release's wins.
//! - Inside a family, known patch levels are tested with a substring check on
//!   the FULL release string. Patch levels that ship lettered revisions are
//!   probed newest first (`d`, `c`, `b`, then unlettered) against the asset
//!   store, so a newer revision supersedes an older one without a table edit.
//! - A family match with no patch match falls back to the newest script
//!   cataloged for that family.
//!
//! The matcher never fails on malformed input; it returns `None` and the
//! caller reports the kernel as unsupported.

/// Existence check against the driver asset folder of one family.
pub trait AssetProbe {
    fn script_exists(&self, file_name: &str) -> bool;
}

impl<F> AssetProbe for F
where
    F: Fn(&str) -> bool,
{
    fn script_exists(&self, file_name: &str) -> bool {
        self(file_name)
    }
}

/// Lettered revision suffixes, newest first.
const REVISIONS: [&str; 3] = ["d", "c", "b"];

/// A script stem and whether lettered revisions of it may exist.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    stem: &'static str,
    revisions: bool,
}

impl Candidate {
    const fn plain(stem: &'static str) -> Self {
        Candidate { stem, revisions: false }
    }

    const fn revised(stem: &'static str) -> Self {
        Candidate { stem, revisions: true }
    }

    fn resolve(&self, probe: &dyn AssetProbe) -> String {
        if self.revisions {
            for rev in REVISIONS {
                let name = format!("{}{}.sh", self.stem, rev);
                if probe.script_exists(&name) {
                    return name;
                }
            }
        }
        format!("{}.sh", self.stem)
    }
}

/// Known patch level inside a family: substring needle and its script.
#[derive(Debug, Clone, Copy)]
struct PatchRule {
    needle: &'static str,
    script: Candidate,
}

#[derive(Debug, Clone, Copy)]
struct FamilyRule {
    base: &'static str,
    patches: &'static [PatchRule],
    fallback: Candidate,
}

const fn patch(needle: &'static str, script: Candidate) -> PatchRule {
    PatchRule { needle, script }
}

/// Family table, most specific first.
const FAMILIES: &[FamilyRule] = &[
    FamilyRule { base: "6.6", patches: &[], fallback: Candidate::plain("6.6") },
    FamilyRule { base: "6.1", patches: &[], fallback: Candidate::plain("6.1") },
    FamilyRule { base: "5.15", patches: &[], fallback: Candidate::plain("5.15") },
    FamilyRule { base: "5.10", patches: &[], fallback: Candidate::plain("5.10") },
    FamilyRule { base: "5.4", patches: &[], fallback: Candidate::revised("5.4") },
    FamilyRule {
        base: "4.19",
        patches: &[
            patch("4.19.191", Candidate::revised("4.19.191")),
            patch("4.19.157", Candidate::revised("4.19.157")),
            patch("4.19.113", Candidate::plain("4.19.113")),
            patch("4.19.81", Candidate::plain("4.19.81")),
        ],
        fallback: Candidate::plain("4.19.191"),
    },
    FamilyRule {
        base: "4.14",
        patches: &[
            patch("4.14.190", Candidate::plain("4.14.190")),
            patch("4.14.186", Candidate::revised("4.14.186")),
            patch("4.14.180", Candidate::plain("4.14.180")),
            patch("4.14.141", Candidate::plain("4.14.141")),
            patch("4.14.117", Candidate::plain("4.14.117")),
        ],
        fallback: Candidate::plain("4.14.186"),
    },
    FamilyRule { base: "4.9", patches: &[], fallback: Candidate::plain("4.9.186") },
];

/// The `major.minor` view of a raw kernel release string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelVersion {
    pub raw: String,
    pub major: String,
    pub minor: String,
}

impl KernelVersion {
    /// Split a release string. Returns `None` when there are fewer than two
    /// dot-separated components.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut parts = raw.split('.');
        let major = parts.next()?;
        let minor_part = parts.next()?;
        let minor = minor_part.split('-').next().unwrap_or(minor_part);
        if major.is_empty() || minor.is_empty() {
            return None;
        }
        Some(KernelVersion {
            raw: raw.to_string(),
            major: major.to_string(),
            minor: minor.to_string(),
        })
    }

    /// `major.minor`, e.g. `5.10`.
    pub fn base(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

/// Kernel families a driver script exists for, most specific first.
pub fn supported_families() -> Vec<&'static str> {
    FAMILIES.iter().map(|f| f.base).collect()
}

/// Whether the release belongs to a supported family.
pub fn is_compatible(kernel_version: &str) -> bool {
    family_for(kernel_version).is_some()
}

/// Family base (`major.minor`) the release resolves to.
pub fn family_for(kernel_version: &str) -> Option<&'static str> {
    let version = KernelVersion::parse(kernel_version)?;
    let base = version.base();
    FAMILIES.iter().find(|f| f.base == base).map(|f| f.base)
}

/// Pick the install script for a kernel release.
///
/// # Examples
///
/// ```
/// use gamecamp::kernel::matcher::match_driver_script;
///
/// let none = |_: &str| false;
/// assert_eq!(match_driver_script("5.10.66-gki", &none), Some("5.10.sh".to_string()));
/// assert_eq!(match_driver_script("3.18.0", &none), None);
/// ```
pub fn match_driver_script(kernel_version: &str, probe: &dyn AssetProbe) -> Option<String> {
    let version = KernelVersion::parse(kernel_version)?;
    let base = version.base();
    let family = FAMILIES.iter().find(|f| f.base == base)?;

    let candidate = family
        .patches
        .iter()
        .find(|p| version.raw.contains(p.needle))
        .map(|p| p.script)
        .unwrap_or(family.fallback);

    Some(candidate.resolve(probe))
}
