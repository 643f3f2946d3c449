//! Driver script asset store.
//!
//! Scripts live under `<root>/drivers/<family-folder>/<file>.sh`. Installing a
//! driver copies the matched script into the cache directory and marks it
//! executable; the staged copy is removed once the install finishes.

use crate::error::AssetError;
use crate::kernel::matcher::AssetProbe;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

static SCRIPT_NAME_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*\.sh$").ok());

/// Validate a script or folder name before it is joined into a path or a
/// shell command line.
pub fn validate_script_name(name: &str) -> Result<(), AssetError> {
    match SCRIPT_NAME_RE.as_ref() {
        Some(re) if re.is_match(name) => Ok(()),
        Some(_) => Err(AssetError::InvalidName(name.to_string())),
        None => Err(AssetError::InvalidName(
            "failed to compile validation regex".to_string(),
        )),
    }
}

/// Read-only bundle of driver install scripts.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AssetStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/drivers/<folder>`
    pub fn folder_path(&self, folder: &str) -> PathBuf {
        self.root.join("drivers").join(folder)
    }

    /// Probe a script by opening and closing it.
    pub fn exists(&self, folder: &str, file_name: &str) -> bool {
        if validate_script_name(file_name).is_err() {
            return false;
        }
        fs::File::open(self.folder_path(folder).join(file_name)).is_ok()
    }

    /// Sorted `.sh` file names in a family folder. Missing folder yields an
    /// empty list.
    pub fn list(&self, folder: &str) -> Vec<String> {
        let entries = match fs::read_dir(self.folder_path(folder)) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("[Assets] Cannot list {}: {}", folder, e);
                return Vec::new();
            }
        };

        let mut scripts: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
            .filter(|name| name.ends_with(".sh"))
            .collect();
        scripts.sort();
        scripts
    }

    /// Existence probe bound to one family folder, for the matcher.
    pub fn probe<'a>(&'a self, folder: &'a str) -> FolderProbe<'a> {
        FolderProbe { store: self, folder }
    }

    /// Copy a script into `cache_dir` and make it executable.
    pub fn stage(&self, folder: &str, file_name: &str, cache_dir: &Path) -> Result<PathBuf, AssetError> {
        validate_script_name(file_name)?;
        let source = self.folder_path(folder).join(file_name);
        if !self.exists(folder, file_name) {
            return Err(AssetError::NotFound(format!(
                "drivers/{}/{}",
                folder, file_name
            )));
        }

        fs::create_dir_all(cache_dir)?;
        let target = cache_dir.join(file_name);
        fs::copy(&source, &target).map_err(|e| {
            AssetError::StagingFailed(format!(
                "copy {} -> {}: {}",
                source.display(),
                target.display(),
                e
            ))
        })?;

        let mut perms = fs::metadata(&target)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&target, perms)?;

        log::debug!("[Assets] Staged {} at {}", file_name, target.display());
        Ok(target)
    }
}

/// [`AssetProbe`] over a single family folder of an [`AssetStore`].
pub struct FolderProbe<'a> {
    store: &'a AssetStore,
    folder: &'a str,
}

impl AssetProbe for FolderProbe<'_> {
    fn script_exists(&self, file_name: &str) -> bool {
        self.store.exists(self.folder, file_name)
    }
}

/// Whether a staged file is present and has an execute bit.
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
