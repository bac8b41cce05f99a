// src/stages/stop.rs

use crate::context::RunContext;
use crate::stage::{Stage, StageFuture};

pub const NAME: &str = "stop";

/// Final status line of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopStage;

impl Stage for StopStage {
    fn name(&self) -> &str {
        NAME
    }

    fn execute(&self, ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            println!("Stopping");
            Ok(ctx)
        })
    }
}
