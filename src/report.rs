// src/report.rs

//! Outcome reporting.
//!
//! Computing the outcome ([`ExitStatus::from_outcome`]) is kept apart from
//! acting on it: only `main` turns an [`ExitStatus`] into a process exit.

use std::error::Error as StdError;

use tracing::{error, info};

use crate::engine::{RunOutcome, RunReport};

/// Final status of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitStatus {
    #[default]
    Success,
    Failure,
}

impl ExitStatus {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Success => ExitStatus::Success,
            RunOutcome::Failed { .. } => ExitStatus::Failure,
        }
    }

    /// Process exit code for this status.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }
}

/// Surface a settled run to the operator.
pub fn report(report: &RunReport) {
    let elapsed_ms = report.elapsed.as_millis() as u64;

    match &report.outcome {
        RunOutcome::Success => {
            info!(run_id = report.run_id, elapsed_ms, "run finished");
            println!("[sitegen] Run {} finished in {} ms", report.run_id, elapsed_ms);
        }
        RunOutcome::Failed { stage, error } => {
            error!(
                run_id = report.run_id,
                stage = %stage,
                elapsed_ms,
                error = %error,
                "run failed"
            );
            eprintln!("[sitegen] Run {} failed: {}", report.run_id, error);
        }
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();

    while let Some(source) = current {
        let text = source.to_string();
        // Some wrappers already include their source in their own message.
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        current = source.source();
    }

    rendered
}
