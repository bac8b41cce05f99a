use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::Semaphore;

use sitegen::context::RunContext;
use sitegen::stage::{Stage, StageError, StageFuture};

/// Shared, ordered log of `"<stage>@<run_id>"` entries.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A stage that logs its invocation, records which fields it could see, and
/// contributes one field named after itself.
pub struct RecordingStage {
    name: String,
    log: CallLog,
    seen: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    fail: bool,
}

impl RecordingStage {
    pub fn new(name: &str, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            seen: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing(name: &str, log: CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(name, log)
        }
    }

    /// Field names visible to this stage on each invocation.
    pub fn seen(&self) -> Arc<Mutex<Vec<(String, Vec<String>)>>> {
        Arc::clone(&self.seen)
    }
}

impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, mut ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}@{}", self.name, ctx.run_id()));

            let visible: Vec<String> = ctx.keys().map(str::to_string).collect();
            self.seen.lock().unwrap().push((self.name.clone(), visible));

            tokio::task::yield_now().await;

            if self.fail {
                return Err(StageError::new(format!("{} exploded", self.name)));
            }

            ctx.set(self.name.clone(), Value::String(format!("from {}", self.name)))?;
            Ok(ctx)
        })
    }
}

/// A stage that blocks until the test releases it, while tracking how many
/// instances are executing at the same time.
pub struct GatedStage {
    name: String,
    gate: Arc<Semaphore>,
    entered: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

/// Test-side controls for a [`GatedStage`].
#[derive(Clone)]
pub struct Gate {
    gate: Arc<Semaphore>,
    entered: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl Gate {
    /// Let `n` waiting (or future) invocations finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Number of invocations that have started.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Highest number of invocations observed executing at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl GatedStage {
    pub fn new(name: &str) -> (Self, Gate) {
        let gate = Arc::new(Semaphore::new(0));
        let entered = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let stage = Self {
            name: name.to_string(),
            gate: Arc::clone(&gate),
            entered: Arc::clone(&entered),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::clone(&max_active),
        };
        (
            stage,
            Gate {
                gate,
                entered,
                max_active,
            },
        )
    }
}

impl Stage for GatedStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            self.entered.fetch_add(1, Ordering::SeqCst);

            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StageError::with_source("gate closed", e))?;
            permit.forget();

            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(ctx)
        })
    }
}
