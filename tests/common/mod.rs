#![allow(dead_code, unused_imports)]

pub use sitegen_test_utils::fake_backend::{BackendControl, ControllableBackend};
pub use sitegen_test_utils::stages::{call_log, calls, CallLog, Gate, GatedStage, RecordingStage};
pub use sitegen_test_utils::{init_tracing, wait_until, with_timeout};

use std::path::Path;
use std::sync::Arc;

use sitegen::context::{RunContext, Settings};

/// Settings rooted at `source`, with the default output directory.
pub fn settings_for(source: &Path) -> Arc<Settings> {
    Arc::new(Settings::new(source))
}

/// Fresh context for run `run_id` rooted at `source`.
pub fn context_for(run_id: u64, source: &Path) -> RunContext {
    RunContext::new(run_id, settings_for(source))
}
