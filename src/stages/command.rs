// src/stages/command.rs

//! Stage backed by an external command.

use std::process::Stdio;

use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::exec::shell_command;
use crate::stage::{Stage, StageError, StageFuture};
use crate::stages::start::ENV_FIELD;

pub const SOURCE_DIR_VAR: &str = "SITEGEN_SOURCE_DIR";
pub const OUTPUT_DIR_VAR: &str = "SITEGEN_OUTPUT_DIR";
pub const ENV_FILE_VAR: &str = "SITEGEN_ENV_FILE";
pub const RUN_ID_VAR: &str = "SITEGEN_RUN_ID";

/// Runs `cmd` through the platform shell inside the source directory.
///
/// The child receives:
/// - the current context fields as one JSON object on stdin
/// - `SITEGEN_*` variables describing the run
/// - every scalar entry of the `env` field as an environment variable
///
/// A JSON object printed on stdout becomes this stage's context field; any
/// other output is stored as `{"stdout": "..."}`.
#[derive(Debug, Clone)]
pub struct CommandStage {
    name: String,
    cmd: String,
}

impl CommandStage {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
        }
    }

    async fn run(&self, mut ctx: RunContext) -> Result<RunContext, StageError> {
        let run_id = ctx.run_id();
        info!(run_id, stage = %self.name, cmd = %self.cmd, "starting stage command");

        let mut command = shell_command(&self.cmd);
        command
            .current_dir(ctx.source_dir())
            .env(SOURCE_DIR_VAR, ctx.source_dir())
            .env(OUTPUT_DIR_VAR, ctx.output_dir())
            .env(RUN_ID_VAR, run_id.to_string())
            .envs(env_overlay(ctx.get(ENV_FIELD)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(env_file) = &ctx.settings().env_file {
            command.env(ENV_FILE_VAR, env_file);
        }

        let mut child = command.spawn().map_err(|e| {
            StageError::with_source(format!("spawning `{}`", self.cmd), e)
        })?;

        // Feed stdin from a separate task so a child that writes before it
        // reads cannot deadlock against us.
        let payload = serde_json::to_vec(&ctx.fields_json())?;
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&payload).await {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
                Ok(())
            })
        });

        let output = child.wait_with_output().await.map_err(|e| {
            StageError::with_source(format!("waiting for `{}`", self.cmd), e)
        })?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(stage = %self.name, error = %e, "failed to write context to stdin"),
                Err(e) => warn!(stage = %self.name, error = %e, "stdin writer task failed"),
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(stage = %self.name, run_id, "stderr: {}", line);
        }

        let code = output.status.code().unwrap_or(-1);
        info!(
            run_id,
            stage = %self.name,
            exit_code = code,
            success = output.status.success(),
            "stage command exited"
        );

        if !output.status.success() {
            return Err(StageError::CommandFailed {
                cmd: self.cmd.clone(),
                code,
                stderr: stderr.into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        ctx.set(self.name.clone(), stdout_field(&stdout))?;
        Ok(ctx)
    }
}

impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: RunContext) -> StageFuture<'_> {
        Box::pin(self.run(ctx))
    }
}

/// Scalar entries of the env overlay, stringified.
fn env_overlay(env: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = env else {
        return Vec::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

fn stdout_field(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return json!({});
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({ "stdout": trimmed }),
    }
}
