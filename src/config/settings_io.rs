use std::fs;
use std::path::{Path, PathBuf};

use crate::config::settings::Settings;
use crate::error::ConfigError;

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("intent_explain");
    path.push("settings.json");
    path
}

/// Loads and validates settings from `path`, or from the default location.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(settings_path);

    let raw = fs::read_to_string(&path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => {
            ConfigError::Missing(format!("settings file {}", path.display()))
        }
        _ => ConfigError::Io {
            path: path.clone(),
            source,
        },
    })?;

    let settings: Settings = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    settings.validate()?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(settings).map_err(|source| ConfigError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
