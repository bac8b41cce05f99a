// src/context.rs

//! The run-scoped record threaded through every stage.
//!
//! A [`RunContext`] is created fresh for each run and dropped when the run
//! settles. It is deliberately not `Clone`: nothing from one run can leak into
//! the next one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::engine::RunId;
use crate::stage::StageError;

/// Owner recorded for fields written outside of any stage.
pub const RUN_OWNER: &str = "run";

/// Immutable settings shared by every run of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Absolute path to the input root.
    pub source_dir: PathBuf,
    /// Optional JSON override file.
    pub env_file: Option<PathBuf>,
    /// Directory the `clean` stage resets and later stages write into.
    pub output_dir: PathBuf,
}

impl Settings {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        let output_dir = source_dir.join(crate::config::DEFAULT_OUTPUT_DIR);
        Self {
            source_dir,
            env_file: None,
            output_dir,
        }
    }

    pub fn with_env_file(mut self, env_file: impl Into<PathBuf>) -> Self {
        self.env_file = Some(env_file.into());
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    owner: String,
    value: Value,
}

/// Mutable state of one run.
#[derive(Debug)]
pub struct RunContext {
    run_id: RunId,
    settings: Arc<Settings>,
    current_stage: Option<String>,
    fields: BTreeMap<String, Field>,
}

impl RunContext {
    pub fn new(run_id: RunId, settings: Arc<Settings>) -> Self {
        Self {
            run_id,
            settings,
            current_stage: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn source_dir(&self) -> &Path {
        &self.settings.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    /// Name of the stage currently holding the context, if any.
    pub fn current_stage(&self) -> Option<&str> {
        self.current_stage.as_deref()
    }

    /// Mark `stage` as the writer for subsequent [`set`](Self::set) calls.
    ///
    /// Called by the pipeline before each stage invocation.
    pub fn enter_stage(&mut self, stage: &str) {
        self.current_stage = Some(stage.to_string());
    }

    pub fn leave_stage(&mut self) {
        self.current_stage = None;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).map(|f| &f.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Stage that created `key`.
    pub fn owner_of(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|f| f.owner.as_str())
    }

    /// Add or overwrite a field.
    ///
    /// The first writer of a key owns it; any other stage trying to overwrite
    /// it gets [`StageError::NotOwner`].
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), StageError> {
        let key = key.into();
        let writer = self.writer().to_string();

        if let Some(existing) = self.fields.get_mut(&key) {
            if existing.owner != writer {
                return Err(StageError::NotOwner {
                    key,
                    owner: existing.owner.clone(),
                    stage: writer,
                });
            }
            existing.value = value.into();
            return Ok(());
        }

        self.fields.insert(
            key,
            Field {
                owner: writer,
                value: value.into(),
            },
        );
        Ok(())
    }

    /// Remove a field owned by the current writer.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, StageError> {
        let writer = self.writer().to_string();
        let owner = match self.fields.get(key) {
            Some(field) => field.owner.clone(),
            None => return Ok(None),
        };

        if owner != writer {
            return Err(StageError::NotOwner {
                key: key.to_string(),
                owner,
                stage: writer,
            });
        }

        Ok(self.fields.remove(key).map(|f| f.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields as one JSON object, keyed by field name.
    pub fn fields_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, f)| (k.clone(), f.value.clone()))
            .collect();
        Value::Object(map)
    }

    fn writer(&self) -> &str {
        self.current_stage.as_deref().unwrap_or(RUN_OWNER)
    }
}
