// src/config/mod.rs

//! Configuration loading and validation for sitegen.
//!
//! Responsibilities:
//! - Define the TOML-backed project config model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate stage references (`validate.rs`).
//! - Validate the CLI-supplied source directory and env file (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, PipelineSection, RawConfigFile, StageConfig, WatchSection, DEFAULT_CONFIG_FILE,
    DEFAULT_OUTPUT_DIR,
};
pub use settings::{validate_startup, StartupPaths};
pub use validate::validate_config;
