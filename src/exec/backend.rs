// src/exec/backend.rs

//! Pluggable run backend abstraction.
//!
//! The runtime talks to a `RunBackend` instead of driving the pipeline
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation here.
//!
//! - `PipelineBackend` is the default implementation used by `sitegen`. It
//!   spawns each run on its own Tokio task and reports the settlement back
//!   over the coordinator channel.
//! - Tests can provide their own `RunBackend` that, for example, records which
//!   runs were launched and settles them on demand.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use crate::context::{RunContext, Settings};
use crate::engine::{CoordinatorEvent, RunOutcome, RunReport, ScheduledRun};
use crate::errors::Result;
use crate::pipeline::Pipeline;
use crate::report::error_chain;

/// Stage name reported when a run ends in a panic instead of a stage error.
pub const PANICKED_STAGE: &str = "<panicked>";

/// Trait abstracting how a scheduled run is executed.
///
/// Implementations must eventually send exactly one
/// `CoordinatorEvent::RunSettled` for every launched run, and must not block
/// the caller until the run settles: the runtime keeps handling triggers while
/// a run is in flight.
pub trait RunBackend: Send {
    fn launch(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend: a fresh [`RunContext`] per run, driven through the
/// pipeline on a background task.
pub struct PipelineBackend {
    pipeline: Pipeline,
    settings: Arc<Settings>,
    events_tx: mpsc::Sender<CoordinatorEvent>,
}

impl PipelineBackend {
    pub fn new(
        pipeline: Pipeline,
        settings: Arc<Settings>,
        events_tx: mpsc::Sender<CoordinatorEvent>,
    ) -> Self {
        Self {
            pipeline,
            settings,
            events_tx,
        }
    }
}

impl RunBackend for PipelineBackend {
    fn launch(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let pipeline = self.pipeline.clone();
        let ctx = RunContext::new(run.run_id, Arc::clone(&self.settings));
        let tx = self.events_tx.clone();

        Box::pin(async move {
            info!(run_id = run.run_id, reason = ?run.reason, "run started");

            tokio::spawn(async move {
                let started = Instant::now();
                let run_id = run.run_id;

                // The pipeline runs on its own task so a panicking stage still
                // settles the run.
                let outcome = match tokio::spawn(async move { pipeline.run(ctx).await }).await {
                    Ok(Ok(ctx)) => {
                        debug!(run_id, fields = ?ctx.keys().collect::<Vec<_>>(), "run context complete");
                        RunOutcome::Success
                    }
                    Ok(Err(err)) => RunOutcome::Failed {
                        stage: err.stage.clone(),
                        error: error_chain(&err),
                    },
                    Err(join_err) => {
                        error!(run_id, error = %join_err, "run task aborted");
                        RunOutcome::Failed {
                            stage: PANICKED_STAGE.to_string(),
                            error: join_failure(join_err),
                        }
                    }
                };

                let report = RunReport {
                    run_id,
                    outcome,
                    elapsed: started.elapsed(),
                };

                if tx.send(CoordinatorEvent::RunSettled(report)).await.is_err() {
                    warn!(run_id, "coordinator channel closed before run settled");
                }
            });

            Ok(())
        })
    }
}

/// Render a failed run task as an error message.
fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("run task was cancelled: {err}");
    }

    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("stage panicked: {message}")
}
