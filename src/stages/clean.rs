// src/stages/clean.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::context::RunContext;
use crate::stage::{Stage, StageError, StageFuture};

pub const NAME: &str = "clean";

/// Context field holding the output directory, as a string.
pub const OUTPUT_DIR_FIELD: &str = "output_dir";

/// Removes and recreates the output directory so every run starts from an
/// empty target.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanStage;

impl Stage for CleanStage {
    fn name(&self) -> &str {
        NAME
    }

    fn execute(&self, mut ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            println!("Cleaning");

            let output = ctx.output_dir().to_path_buf();
            ensure_safe_target(ctx.source_dir(), &output)?;

            match tokio::fs::remove_dir_all(&output).await {
                Ok(()) => debug!(dir = %output.display(), "removed previous output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StageError::with_source(
                        format!("removing output directory {}", output.display()),
                        e,
                    ));
                }
            }

            tokio::fs::create_dir_all(&output).await.map_err(|e| {
                StageError::with_source(
                    format!("creating output directory {}", output.display()),
                    e,
                )
            })?;

            info!(run_id = ctx.run_id(), dir = %output.display(), "output directory reset");
            ctx.set(OUTPUT_DIR_FIELD, output.to_string_lossy().into_owned())?;
            Ok(ctx)
        })
    }
}

/// The output directory must not be the source tree or one of its ancestors.
fn ensure_safe_target(source: &Path, output: &Path) -> Result<(), StageError> {
    let source = normalize(source);
    let output = normalize(output);

    if source.starts_with(&output) {
        return Err(StageError::new(format!(
            "refusing to clean {}: it contains the source directory {}",
            output.display(),
            source.display()
        )));
    }
    Ok(())
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
