// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::RunBackend;
use crate::report::{self, ExitStatus};

use super::core::CoreCoordinator;
use super::{CoordinatorEvent, CoreCommand};

/// Drives the coordinator in response to `CoordinatorEvent`s and delegates
/// run execution to a `RunBackend`.
///
/// This is a pure IO shell around `CoreCoordinator`, which contains all the
/// re-entrancy semantics. It returns the final [`ExitStatus`] instead of
/// exiting the process.
pub struct Runtime<B: RunBackend> {
    core: CoreCoordinator,
    event_rx: mpsc::Receiver<CoordinatorEvent>,
    backend: B,
}

impl<B: RunBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: RunBackend> Runtime<B> {
    pub fn new(
        core: CoreCoordinator,
        event_rx: mpsc::Receiver<CoordinatorEvent>,
        backend: B,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `CoordinatorEvent`s from `event_rx`.
    /// - Feeds them into the core coordinator.
    /// - Executes the commands it returns (launch run, report, exit).
    pub async fn run(mut self) -> Result<ExitStatus> {
        info!(mode = ?self.core.mode(), "sitegen runtime started");
        let mut status = ExitStatus::Success;

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("coordinator event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                if let Some(exit) = self.execute_command(command).await? {
                    status = exit;
                }
            }

            if !step.keep_running {
                info!("coordinator requested exit; stopping runtime");
                break;
            }
        }

        info!(status = ?status, runs = self.core.started_runs(), "runtime exiting");
        Ok(status)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<Option<ExitStatus>> {
        match command {
            CoreCommand::StartRun(run) => {
                self.backend.launch(run).await?;
                Ok(None)
            }
            CoreCommand::Report(run_report) => {
                report::report(&run_report);
                Ok(None)
            }
            CoreCommand::Exit(status) => Ok(Some(status)),
        }
    }
}
