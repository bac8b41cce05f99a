// src/engine/mod.rs

//! Run coordination for sitegen.
//!
//! This module ties together:
//! - the run state machine (at most one pipeline run in flight, coalescing of
//!   triggers that arrive mid-run)
//! - the main runtime event loop that reacts to:
//!   - the initial start
//!   - file-watch triggers
//!   - run settlements
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;
use std::time::Duration;

/// Identifier of one pipeline run, increasing from 1.
pub type RunId = u64;

/// Whether the process builds once or keeps watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run once and exit with the run's status.
    SingleShot,
    /// Watch and re-run indefinitely; failures are reported, never fatal.
    Monitor,
}

/// Why a run was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerReason {
    /// The initial run at startup.
    Startup,
    /// A change under this watched root while the coordinator was idle.
    FileWatch { root: PathBuf },
    /// One or more changes arrived while the previous run was in flight.
    PendingRerun { coalesced: usize },
}

/// A run the coordinator wants the shell to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub run_id: RunId,
    pub reason: TriggerReason,
}

/// Terminal result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed {
        /// Stage that failed.
        stage: String,
        /// Full rendered error chain.
        error: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

/// Settlement of a run, as handed to the outcome reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    pub elapsed: Duration,
}

/// Events flowing into the coordinator from the driver, watchers and runs.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// Initial run request at process start.
    Start,
    /// Something changed under a watched root.
    Triggered { root: PathBuf },
    /// A run finished, successfully or not.
    RunSettled(RunReport),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::{CoreCoordinator, RunState};
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
