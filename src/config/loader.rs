// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile, DEFAULT_CONFIG_FILE};
use crate::errors::{Result, SitegenError};
use crate::fs::FileSystem;

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(fs, &path)?;
    ConfigFile::try_from(raw_config)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
pub fn load_or_default(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !fs.exists(path) {
        debug!(path = %path.display(), "no project config; using built-in pipeline");
        return Ok(ConfigFile::default());
    }
    if !fs.is_file(path) {
        return Err(SitegenError::ConfigError(format!(
            "config path {} is not a file",
            path.display()
        )));
    }
    load_and_validate(fs, path)
}

/// Default config location for a source directory.
pub fn default_config_path(source_dir: &Path) -> PathBuf {
    source_dir.join(DEFAULT_CONFIG_FILE)
}
