// src/stage.rs

//! The stage contract.
//!
//! A stage takes ownership of the run's [`RunContext`], does its work
//! (filesystem writes, child processes, status lines) and hands the context
//! back, or fails with a [`StageError`]. The pipeline treats stages as opaque.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::context::RunContext;

/// Boxed future returned by [`Stage::execute`].
pub type StageFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RunContext, StageError>> + Send + 'a>>;

/// One discrete, ordered unit of pipeline work.
///
/// Implementations must be safe to re-run from scratch: every run starts from
/// a fresh context, so a stage may not rely on state left by a previous run.
pub trait Stage: Send + Sync {
    /// Name used in logs, error reports and as the owner of the fields this
    /// stage writes into the context.
    fn name(&self) -> &str;

    /// Execute the stage against `ctx`.
    fn execute(&self, ctx: RunContext) -> StageFuture<'_>;
}

/// Failure of a single stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("field '{key}' is owned by stage '{owner}' and cannot be changed by '{stage}'")]
    NotOwner {
        key: String,
        owner: String,
        stage: String,
    },

    #[error("command `{cmd}` exited with status {code}{}", stderr_suffix(.stderr))]
    CommandFailed {
        cmd: String,
        code: i32,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        StageError::Failed {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StageError::Failed {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
