//! `testlogger.toml` settings file loading.
use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::level::Level;

/// Default settings file name, looked up in the package directory.
pub(crate) const SETTINGS_FILE: &str = "testlogger.toml";

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileSettings {
    /// Base directory for log files; relative to the settings file.
    pub logsdir: Option<PathBuf>,
    /// Threshold for handlers without an explicit level.
    #[serde(default, deserialize_with = "deserialize_level")]
    pub level: Option<Level>,
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<Option<Level>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| s.parse::<Level>().map_err(serde::de::Error::custom))
        .transpose()
}

/// Deserialize a TOML file, treating a missing file as empty.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub(crate) fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        // Return empty config for missing files by deserializing empty TOML
        return toml::from_str("").context("Failed to create empty config");
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
}

/// Load settings from `path`, resolving a relative `logsdir` against the
/// file's directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub(crate) fn load_settings(path: &Path) -> Result<FileSettings> {
    let mut settings: FileSettings = load_config(path)?;
    if let Some(logsdir) = settings.logsdir.take() {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        settings.logsdir = Some(if logsdir.is_relative() {
            base.join(logsdir)
        } else {
            logsdir
        });
    }
    Ok(settings)
}

/// Settings file used when none is configured explicitly.
pub(crate) fn default_settings_path() -> Option<PathBuf> {
    std::env::var_os("CARGO_MANIFEST_DIR").map(|dir| PathBuf::from(dir).join(SETTINGS_FILE))
}
