// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Output directory used when `[pipeline].output_dir` is not set, relative to
/// the source directory.
pub const DEFAULT_OUTPUT_DIR: &str = "_output";

/// File name looked up inside the source directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "sitegen.toml";

/// Project configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [pipeline]
/// stages = ["start", "clean", "data", "render", "copy", "stop"]
/// output_dir = "_output"
///
/// [watch]
/// dirs = ["data", "views"]
///
/// [stage.data]
/// cmd = "node build/data.js"
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// Command stages from `[stage.<name>]`, keyed by stage name.
    #[serde(default)]
    pub stage: BTreeMap<String, StageConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub watch: WatchSection,
    pub stage: BTreeMap<String, StageConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        pipeline: PipelineSection,
        watch: WatchSection,
        stage: BTreeMap<String, StageConfig>,
    ) -> Self {
        Self {
            pipeline,
            watch,
            stage,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            PipelineSection::default(),
            WatchSection::default(),
            BTreeMap::new(),
        )
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Stage names in execution order. Built-ins: `start`, `clean`, `stop`.
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,

    /// Output directory, relative to the source directory unless absolute.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_stages() -> Vec<String> {
    ["start", "clean", "stop"].iter().map(|s| s.to_string()).collect()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            stages: default_stages(),
            output_dir: default_output_dir(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Directories to watch in monitor mode, relative to the source directory.
    ///
    /// Each one is watched non-recursively. When empty, every top-level
    /// directory of the source tree is watched.
    #[serde(default)]
    pub dirs: Vec<String>,
}

/// `[stage.<name>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StageConfig {
    /// Shell command run for this stage.
    pub cmd: String,
}
