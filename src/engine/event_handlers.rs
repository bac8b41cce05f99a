// src/engine/event_handlers.rs

//! Transition logic for the core coordinator.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::engine::core::{CoreCoordinator, RunState};
use crate::engine::{RunMode, RunReport, ScheduledRun, TriggerReason};
use crate::report::ExitStatus;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Build a fresh context and drive it through the pipeline.
    StartRun(ScheduledRun),
    /// Hand a settled run to the outcome reporter.
    Report(RunReport),
    /// The driver should stop with this status.
    Exit(ExitStatus),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn stop_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// Handle the initial start request.
pub fn handle_start(core: &mut CoreCoordinator) -> CoreStep {
    if let Some(run_id) = core.state().in_flight() {
        warn!(run_id, "start requested while a run is in flight; ignoring");
        return CoreStep::continue_with(Vec::new());
    }

    CoreStep::continue_with(vec![start_run(core, TriggerReason::Startup)])
}

/// Handle a change notification from one of the watched roots.
///
/// - `Idle`: start a run immediately.
/// - `Running`: remember that one more run is owed.
/// - `RunningWithPendingRerun`: already owed; the trigger is coalesced.
pub fn handle_trigger(core: &mut CoreCoordinator, root: PathBuf) -> CoreStep {
    if core.mode() == RunMode::SingleShot {
        debug!(root = %root.display(), "trigger ignored in single-shot mode");
        return CoreStep::continue_with(Vec::new());
    }

    match core.state() {
        RunState::Idle => {
            info!(root = %root.display(), "change detected; starting run");
            CoreStep::continue_with(vec![start_run(core, TriggerReason::FileWatch { root })])
        }
        RunState::Running { run_id } => {
            info!(
                run_id,
                root = %root.display(),
                "change detected while run in flight; rerun queued"
            );
            core.set_state(RunState::RunningWithPendingRerun {
                run_id,
                coalesced: 1,
            });
            CoreStep::continue_with(Vec::new())
        }
        RunState::RunningWithPendingRerun { run_id, coalesced } => {
            debug!(
                run_id,
                root = %root.display(),
                coalesced = coalesced + 1,
                "change coalesced into pending rerun"
            );
            core.set_state(RunState::RunningWithPendingRerun {
                run_id,
                coalesced: coalesced + 1,
            });
            CoreStep::continue_with(Vec::new())
        }
    }
}

/// Handle the settlement of a run.
pub fn handle_settlement(core: &mut CoreCoordinator, report: RunReport) -> CoreStep {
    let state = core.state();

    if state.in_flight() != Some(report.run_id) {
        warn!(
            run_id = report.run_id,
            in_flight = ?state.in_flight(),
            "settlement for a run that is not in flight; ignoring"
        );
        return CoreStep::continue_with(Vec::new());
    }

    let status = ExitStatus::from_outcome(&report.outcome);
    let mut commands = vec![CoreCommand::Report(report)];

    if core.mode() == RunMode::SingleShot {
        core.set_state(RunState::Idle);
        commands.push(CoreCommand::Exit(status));
        return CoreStep::stop_with(commands);
    }

    match state {
        RunState::RunningWithPendingRerun { coalesced, .. } => {
            commands.push(start_run(core, TriggerReason::PendingRerun { coalesced }));
        }
        _ => core.set_state(RunState::Idle),
    }

    CoreStep::continue_with(commands)
}

/// Handle a shutdown request.
///
/// A single-shot build interrupted before its run settled did not produce
/// output, so it exits with a failure status.
pub fn handle_shutdown(core: &mut CoreCoordinator) -> CoreStep {
    let status = match (core.mode(), core.state().in_flight()) {
        (RunMode::SingleShot, Some(run_id)) => {
            warn!(run_id, "shutdown requested before the run settled");
            ExitStatus::Failure
        }
        _ => ExitStatus::Success,
    };

    core.set_state(RunState::Idle);
    CoreStep::stop_with(vec![CoreCommand::Exit(status)])
}

fn start_run(core: &mut CoreCoordinator, reason: TriggerReason) -> CoreCommand {
    let run_id = core.allocate_run_id();
    core.set_state(RunState::Running { run_id });
    debug!(run_id, ?reason, "run scheduled");
    CoreCommand::StartRun(ScheduledRun { run_id, reason })
}
