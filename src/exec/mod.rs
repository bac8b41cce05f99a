// src/exec/mod.rs

//! Run execution layer.
//!
//! - [`backend`] provides the `RunBackend` trait the runtime launches runs
//!   through, and the production `PipelineBackend`; tests can replace it with
//!   a controllable fake.
//! - [`shell`] builds platform shell commands for command stages.

pub mod backend;
pub mod shell;

pub use backend::{PipelineBackend, RunBackend};
pub use shell::shell_command;
