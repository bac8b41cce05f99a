// src/stages/start.rs

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::context::RunContext;
use crate::stage::{Stage, StageError, StageFuture};

pub const NAME: &str = "start";

/// Context field holding the env overlay (always a JSON object).
pub const ENV_FIELD: &str = "env";

/// Announces the run and loads the optional JSON env file into [`ENV_FIELD`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StartStage;

impl Stage for StartStage {
    fn name(&self) -> &str {
        NAME
    }

    fn execute(&self, mut ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            println!("Starting");

            let env = match ctx.settings().env_file.clone() {
                Some(path) => load_env_file(&path).await?,
                None => Map::new(),
            };

            debug!(run_id = ctx.run_id(), keys = env.len(), "env overlay loaded");
            ctx.set(ENV_FIELD, Value::Object(env))?;
            Ok(ctx)
        })
    }
}

async fn load_env_file(path: &Path) -> Result<Map<String, Value>, StageError> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        StageError::with_source(format!("reading env file {}", path.display()), e)
    })?;

    let value: Value = serde_json::from_str(&contents).map_err(|e| {
        StageError::with_source(format!("parsing env file {}", path.display()), e)
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(StageError::new(format!(
            "env file {} must contain a JSON object, found {}",
            path.display(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
