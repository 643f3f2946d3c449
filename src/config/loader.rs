//! Config file loader and serialization.

use crate::config::AppConfig;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Global settings path: ~/.config/gamecamp/settings.json
pub fn get_global_settings_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine config directory".to_string())
    })?;
    Ok(config_dir.join("gamecamp").join("settings.json"))
}

/// Load config from a JSON file.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.display().to_string())
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load config, falling back to defaults when the file is missing or broken.
pub fn load_or_default(path: &Path) -> AppConfig {
    match load_config_from_file(path) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(_)) => AppConfig::default(),
        Err(e) => {
            eprintln!(
                "[Config] [WARNING] Failed to load {}, falling back to defaults: {}",
                path.display(),
                e
            );
            AppConfig::default()
        }
    }
}

/// Save config as pretty JSON, creating parent directories.
pub fn save_config_to_file(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    validate_config_path(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json_content = serde_json::to_string_pretty(config)?;
    fs::write(path, json_content)?;
    Ok(())
}

/// Validate config path (.json extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "json" => Ok(()),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .json extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .json extension".to_string(),
        )),
    }
}
