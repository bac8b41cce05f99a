// src/engine/core.rs

//! Pure core coordinator state machine.
//!
//! This module contains a synchronous, deterministic coordinator that
//! consumes [`CoordinatorEvent`]s and produces:
//! - an updated [`RunState`]
//! - a list of commands describing what the IO shell should do next
//!
//! Every transition happens inside one synchronous call to
//! [`CoreCoordinator::step`], so two triggers can never both observe `Idle`.
//! The async shell (`engine::runtime::Runtime`) owns channels, spawning and
//! reporting; the core is unit tested without Tokio.

use tracing::debug;

use crate::engine::event_handlers::{
    handle_settlement, handle_shutdown, handle_start, handle_trigger, CoreStep,
};
use crate::engine::{CoordinatorEvent, RunId, RunMode};

/// Process-wide run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run in flight.
    Idle,
    /// `run_id` is in flight and no change has been seen since it started.
    Running { run_id: RunId },
    /// `run_id` is in flight and `coalesced` triggers arrived since it
    /// started; exactly one follow-up run is owed.
    RunningWithPendingRerun { run_id: RunId, coalesced: usize },
}

impl RunState {
    /// Id of the run in flight, if any.
    pub fn in_flight(&self) -> Option<RunId> {
        match *self {
            RunState::Idle => None,
            RunState::Running { run_id } | RunState::RunningWithPendingRerun { run_id, .. } => {
                Some(run_id)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RunState::Idle)
    }

    pub fn has_pending_rerun(&self) -> bool {
        matches!(self, RunState::RunningWithPendingRerun { .. })
    }
}

/// Pure coordinator state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreCoordinator {
    state: RunState,
    mode: RunMode,
    next_run_id: RunId,
    started_runs: u64,
}

impl CoreCoordinator {
    pub fn new(mode: RunMode) -> Self {
        Self {
            state: RunState::Idle,
            mode,
            next_run_id: 1,
            started_runs: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Number of runs started so far.
    pub fn started_runs(&self) -> u64 {
        self.started_runs
    }

    /// Handle a single event, updating the run state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: CoordinatorEvent) -> CoreStep {
        let before = self.state;

        let step = match event {
            CoordinatorEvent::Start => handle_start(self),
            CoordinatorEvent::Triggered { root } => handle_trigger(self, root),
            CoordinatorEvent::RunSettled(report) => handle_settlement(self, report),
            CoordinatorEvent::ShutdownRequested => handle_shutdown(self),
        };

        if before != self.state {
            debug!(from = ?before, to = ?self.state, "run state transition");
        }

        step
    }

    pub(crate) fn set_state(&mut self, state: RunState) {
        self.state = state;
    }

    /// Reserve the id of the next run and count it as started.
    pub(crate) fn allocate_run_id(&mut self) -> RunId {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.started_runs += 1;
        run_id
    }
}
