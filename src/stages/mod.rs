// src/stages/mod.rs

//! Built-in stages and the stage registry.
//!
//! Only orchestration-level stages are built in:
//! - `start`: status line + loading the JSON env file into the context
//! - `clean`: reset the output directory
//! - `stop`: status line
//!
//! Everything else (reading data, rendering, copying, minifying, removing
//! temporary artifacts) plugs in as a [`CommandStage`] declared in the
//! project config.

use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::{Result, SitegenError};
use crate::pipeline::Pipeline;
use crate::stage::Stage;

pub mod clean;
pub mod command;
pub mod start;
pub mod stop;

pub use clean::CleanStage;
pub use command::CommandStage;
pub use start::StartStage;
pub use stop::StopStage;

/// Names reserved for built-in stages.
pub const BUILTIN_STAGES: &[&str] = &[start::NAME, clean::NAME, stop::NAME];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_STAGES.contains(&name)
}

/// Resolve a single stage by name.
pub fn build_stage(name: &str, cfg: &ConfigFile) -> Result<Arc<dyn Stage>> {
    let stage: Arc<dyn Stage> = match name {
        start::NAME => Arc::new(StartStage),
        clean::NAME => Arc::new(CleanStage),
        stop::NAME => Arc::new(StopStage),
        other => {
            let stage_cfg = cfg.stage.get(other).ok_or_else(|| {
                SitegenError::ConfigError(format!("unknown stage '{other}' in [pipeline].stages"))
            })?;
            Arc::new(CommandStage::new(other, stage_cfg.cmd.clone()))
        }
    };
    Ok(stage)
}

/// Build the process-wide pipeline from a validated config.
pub fn build_pipeline(cfg: &ConfigFile) -> Result<Pipeline> {
    let stages = cfg
        .pipeline
        .stages
        .iter()
        .map(|name| build_stage(name, cfg))
        .collect::<Result<Vec<_>>>()?;
    Ok(Pipeline::new(stages))
}
