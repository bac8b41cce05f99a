// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod stage;
pub mod stages;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, load_or_default, validate_startup};
use crate::context::Settings;
use crate::engine::{CoordinatorEvent, CoreCoordinator, RunMode, Runtime};
use crate::errors::Result;
use crate::exec::PipelineBackend;
use crate::fs::RealFileSystem;
use crate::pipeline::Pipeline;
use crate::report::ExitStatus;
use crate::stages::build_pipeline;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - startup validation (source directory, env file)
/// - project config loading and pipeline construction
/// - (in monitor mode) watch-root resolution
/// - the coordinator runtime, via [`drive`]
pub async fn run(args: CliArgs) -> Result<ExitStatus> {
    let fs = RealFileSystem;

    let startup = validate_startup(&fs, args.source.as_deref(), args.env_file.as_deref())?;

    let cfg = match &args.config {
        Some(path) => load_and_validate(&fs, path)?,
        None => load_or_default(&fs, default_config_path(&startup.source_dir))?,
    };

    let settings = Arc::new(startup.into_settings(&cfg));
    let pipeline = build_pipeline(&cfg)?;

    let mode = if args.monitor {
        RunMode::Monitor
    } else {
        RunMode::SingleShot
    };

    let watch_roots = match mode {
        RunMode::Monitor => watch::resolve_watch_roots(&fs, &settings, &cfg.watch)?,
        RunMode::SingleShot => Vec::new(),
    };

    if args.dry_run {
        print_dry_run(&settings, &pipeline, mode, &watch_roots);
        return Ok(ExitStatus::Success);
    }

    drive(pipeline, settings, mode, &watch_roots).await
}

/// Run the coordinator until it asks to stop.
///
/// - `SingleShot`: no watchers are installed; returns after the first run.
/// - `Monitor`: one watcher per root; returns only on Ctrl-C.
pub async fn drive(
    pipeline: Pipeline,
    settings: Arc<Settings>,
    mode: RunMode,
    watch_roots: &[PathBuf],
) -> Result<ExitStatus> {
    let (rt_tx, rt_rx) = mpsc::channel::<CoordinatorEvent>(64);

    let backend = PipelineBackend::new(pipeline, settings, rt_tx.clone());

    // Kept alive until the runtime returns.
    let _watcher_handle = match mode {
        RunMode::Monitor => Some(watch::spawn_watchers(watch_roots, rt_tx.clone())?),
        RunMode::SingleShot => None,
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(CoordinatorEvent::ShutdownRequested).await;
        });
    }

    rt_tx
        .send(CoordinatorEvent::Start)
        .await
        .map_err(|e| anyhow!("failed to queue initial run: {e}"))?;

    let runtime = Runtime::new(CoreCoordinator::new(mode), rt_rx, backend);
    runtime.run().await
}

fn print_dry_run(settings: &Settings, pipeline: &Pipeline, mode: RunMode, roots: &[PathBuf]) {
    println!("sitegen dry-run");
    println!("  source: {}", settings.source_dir.display());
    println!("  output: {}", settings.output_dir.display());
    if let Some(env_file) = &settings.env_file {
        println!("  env file: {}", env_file.display());
    }
    println!("  mode: {:?}", mode);
    println!();

    println!("stages ({}):", pipeline.len());
    for (i, name) in pipeline.stage_names().enumerate() {
        println!("  {}. {name}", i + 1);
    }

    if !roots.is_empty() {
        println!();
        println!("watching ({}):", roots.len());
        for root in roots {
            println!("  - {}", root.display());
        }
    }

    debug!("dry-run complete (no execution)");
}
