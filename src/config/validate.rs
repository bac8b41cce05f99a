// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SitegenError};
use crate::stages::is_builtin;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitegenError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pipeline, raw.watch, raw.stage))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_stages(cfg)?;
    validate_stage_definitions(cfg)?;
    validate_pipeline_references(cfg)?;
    validate_output_dir(cfg)?;
    Ok(())
}

fn ensure_has_stages(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.stages.is_empty() {
        return Err(SitegenError::ConfigError(
            "[pipeline].stages must list at least one stage".to_string(),
        ));
    }
    Ok(())
}

fn validate_stage_definitions(cfg: &RawConfigFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        if is_builtin(name) {
            return Err(SitegenError::ConfigError(format!(
                "[stage.{name}] shadows the built-in stage '{name}'"
            )));
        }
        if stage.cmd.trim().is_empty() {
            return Err(SitegenError::ConfigError(format!(
                "[stage.{name}].cmd must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_pipeline_references(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for name in cfg.pipeline.stages.iter() {
        if !seen.insert(name.as_str()) {
            return Err(SitegenError::ConfigError(format!(
                "stage '{name}' appears more than once in [pipeline].stages"
            )));
        }
        if !is_builtin(name) && !cfg.stage.contains_key(name) {
            return Err(SitegenError::ConfigError(format!(
                "unknown stage '{name}' in [pipeline].stages (define it as [stage.{name}])"
            )));
        }
    }
    Ok(())
}

fn validate_output_dir(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.output_dir.trim().is_empty() {
        return Err(SitegenError::ConfigError(
            "[pipeline].output_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::StageConfig;

    fn raw(stages: &[&str]) -> RawConfigFile {
        let mut cfg = RawConfigFile::default();
        cfg.pipeline.stages = stages.iter().map(|s| s.to_string()).collect();
        cfg
    }

    fn config_error(cfg: RawConfigFile) -> String {
        match ConfigFile::try_from(cfg) {
            Err(SitegenError::ConfigError(msg)) => msg,
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.pipeline.stages, vec!["start", "clean", "stop"]);
    }

    #[test]
    fn rejects_unknown_and_duplicate_stages() {
        assert!(config_error(raw(&["start", "render"])).contains("unknown stage 'render'"));
        assert!(config_error(raw(&["start", "start"])).contains("more than once"));
        assert!(config_error(raw(&[])).contains("at least one stage"));
    }

    #[test]
    fn rejects_shadowed_builtins_and_empty_commands() {
        let mut cfg = raw(&["clean"]);
        cfg.stage.insert("clean".into(), StageConfig { cmd: "rm -rf /".into() });
        assert!(config_error(cfg).contains("shadows"));

        let mut cfg = raw(&["render"]);
        cfg.stage.insert("render".into(), StageConfig { cmd: "  ".into() });
        assert!(config_error(cfg).contains("must not be empty"));
    }
}
