// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while setting up or driving the build, as opposed to errors
/// raised by an individual stage (see [`crate::stage::StageError`]).
#[derive(Error, Debug)]
pub enum SitegenError {
    #[error("Missing source: pass the directory to build with --source <DIR>")]
    MissingSource,

    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("The env file you provided was not a json file: {}", .0.display())]
    InvalidEnvFile(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SitegenError {
    /// Startup errors are reported before any run begins.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            SitegenError::MissingSource
                | SitegenError::SourceNotFound(_)
                | SitegenError::InvalidEnvFile(_)
                | SitegenError::ConfigError(_)
                | SitegenError::TomlError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SitegenError>;
