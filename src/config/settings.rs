// src/config/settings.rs

//! Startup validation of the source directory and env file.
//!
//! Everything here runs before the coordinator exists; a failure is a fatal
//! startup error and no stage ever executes.

use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::context::Settings;
use crate::errors::{Result, SitegenError};
use crate::fs::FileSystem;

/// Required extension of the env override file.
pub const ENV_FILE_EXTENSION: &str = "json";

/// Paths validated at startup, before the project config is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupPaths {
    pub source_dir: PathBuf,
    pub env_file: Option<PathBuf>,
}

impl StartupPaths {
    /// Combine with the project config into the immutable run settings.
    pub fn into_settings(self, cfg: &ConfigFile) -> Settings {
        let output_dir = self.source_dir.join(&cfg.pipeline.output_dir);
        let mut settings = Settings::new(self.source_dir).with_output_dir(output_dir);
        settings.env_file = self.env_file;
        settings
    }
}

/// Validate `--source` and `--env-file`.
///
/// - a missing source is [`SitegenError::MissingSource`]
/// - a source that is not a directory is [`SitegenError::SourceNotFound`]
/// - an env file without a `.json` extension is [`SitegenError::InvalidEnvFile`]
pub fn validate_startup(
    fs: &dyn FileSystem,
    source: Option<&Path>,
    env_file: Option<&Path>,
) -> Result<StartupPaths> {
    let source = source.ok_or(SitegenError::MissingSource)?;
    let source_dir = absolute(source)?;

    if !fs.is_dir(&source_dir) {
        return Err(SitegenError::SourceNotFound(source_dir));
    }

    let env_file = match env_file {
        Some(path) => {
            if path.extension().and_then(|e| e.to_str()) != Some(ENV_FILE_EXTENSION) {
                return Err(SitegenError::InvalidEnvFile(path.to_path_buf()));
            }
            Some(absolute(path)?)
        }
        None => None,
    };

    Ok(StartupPaths {
        source_dir,
        env_file,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
