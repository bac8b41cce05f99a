// src/pipeline.rs

//! Strictly sequential composition of stages.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::context::RunContext;
use crate::stage::{Stage, StageError};

/// The first stage failure of a run. Later stages were not invoked.
#[derive(Error, Debug)]
#[error("stage '{stage}' (step {} of {total}) failed", .index + 1)]
pub struct PipelineError {
    /// Name of the failing stage.
    pub stage: String,
    /// Zero-based position of the failing stage.
    pub index: usize,
    /// Number of stages in the pipeline.
    pub total: usize,
    #[source]
    pub source: StageError,
}

/// Ordered, immutable list of stages.
///
/// Cloning is cheap; clones share the same stage list.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Stage>]>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names().collect::<Vec<_>>())
            .finish()
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Drive `ctx` through every stage in order.
    ///
    /// Stage N+1 starts only after stage N has settled. The first failure
    /// stops the run and is returned as-is, wrapped with the stage's position.
    pub async fn run(&self, mut ctx: RunContext) -> Result<RunContext, PipelineError> {
        let run_id = ctx.run_id();
        let total = self.stages.len();

        for (index, stage) in self.stages.iter().enumerate() {
            let name = stage.name();
            ctx.enter_stage(name);

            let started = Instant::now();
            info!(run_id, stage = %name, step = index + 1, total, "stage started");

            ctx = match stage.execute(ctx).await {
                Ok(next) => next,
                Err(source) => {
                    warn!(
                        run_id,
                        stage = %name,
                        error = %source,
                        "stage failed; skipping remaining stages"
                    );
                    return Err(PipelineError {
                        stage: name.to_string(),
                        index,
                        total,
                        source,
                    });
                }
            };

            info!(
                run_id,
                stage = %name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "stage finished"
            );
        }

        ctx.leave_stage();
        Ok(ctx)
    }
}
