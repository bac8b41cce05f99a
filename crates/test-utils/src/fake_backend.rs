use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use sitegen::engine::{CoordinatorEvent, RunOutcome, RunReport, ScheduledRun};
use sitegen::errors::Result;
use sitegen::exec::RunBackend;

/// A fake backend that records launched runs and settles them only when the
/// test says so.
pub struct ControllableBackend {
    launched: Arc<Mutex<Vec<ScheduledRun>>>,
}

/// Test-side controls for a [`ControllableBackend`].
#[derive(Clone)]
pub struct BackendControl {
    runtime_tx: mpsc::Sender<CoordinatorEvent>,
    launched: Arc<Mutex<Vec<ScheduledRun>>>,
}

impl ControllableBackend {
    pub fn new(runtime_tx: mpsc::Sender<CoordinatorEvent>) -> (Self, BackendControl) {
        let launched = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                launched: Arc::clone(&launched),
            },
            BackendControl {
                runtime_tx,
                launched,
            },
        )
    }
}

impl BackendControl {
    pub fn launched(&self) -> Vec<ScheduledRun> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_count(&self) -> usize {
        self.launched.lock().unwrap().len()
    }

    pub async fn trigger(&self, root: &str) {
        self.send(CoordinatorEvent::Triggered { root: root.into() }).await;
    }

    pub async fn settle(&self, run_id: u64, outcome: RunOutcome) {
        self.send(CoordinatorEvent::RunSettled(RunReport {
            run_id,
            outcome,
            elapsed: Duration::from_millis(1),
        }))
        .await;
    }

    pub async fn fail(&self, run_id: u64) {
        self.settle(
            run_id,
            RunOutcome::Failed {
                stage: "render".to_string(),
                error: "template missing".to_string(),
            },
        )
        .await;
    }

    pub async fn shutdown(&self) {
        self.send(CoordinatorEvent::ShutdownRequested).await;
    }

    async fn send(&self, event: CoordinatorEvent) {
        self.runtime_tx
            .send(event)
            .await
            .expect("runtime channel closed");
    }
}

impl RunBackend for ControllableBackend {
    fn launch(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let launched = Arc::clone(&self.launched);
        Box::pin(async move {
            launched.lock().unwrap().push(run);
            Ok(())
        })
    }
}
