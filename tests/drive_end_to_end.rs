// tests/drive_end_to_end.rs

mod common;
use crate::common::{call_log, calls, init_tracing, wait_until, with_timeout, RecordingStage};

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use sitegen::config::ConfigFile;
use sitegen::context::{RunContext, Settings};
use sitegen::engine::RunMode;
use sitegen::pipeline::Pipeline;
use sitegen::report::ExitStatus;
use sitegen::stage::{Stage, StageFuture};
use sitegen::stages::build_pipeline;
use sitegen::drive;

type TestResult = Result<(), Box<dyn Error>>;

/// Reads `views/index.html` and counts its invocations.
struct ReadTemplate {
    runs: Arc<AtomicUsize>,
}

impl Stage for ReadTemplate {
    fn name(&self) -> &str {
        "render"
    }

    fn execute(&self, ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::fs::read_to_string(ctx.source_dir().join("views/index.html")).await?;
            Ok(ctx)
        })
    }
}

struct Explode;

impl Stage for Explode {
    fn name(&self) -> &str {
        "render"
    }

    fn execute(&self, ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            if ctx.run_id() > 0 {
                panic!("template engine crashed");
            }
            Ok(ctx)
        })
    }
}

fn site() -> Result<(TempDir, Arc<Settings>), Box<dyn Error>> {
    let dir = TempDir::new()?;
    std::fs::create_dir(dir.path().join("views"))?;
    std::fs::create_dir(dir.path().join("data"))?;
    let settings = Arc::new(Settings::new(dir.path()));
    Ok((dir, settings))
}

#[tokio::test]
async fn single_shot_builtin_pipeline_succeeds() -> TestResult {
    init_tracing();
    let (dir, settings) = site()?;

    // Leftovers from an earlier build must not survive.
    let stale = dir.path().join("_output/stale.html");
    std::fs::create_dir_all(stale.parent().unwrap())?;
    std::fs::write(&stale, "old")?;

    let pipeline = build_pipeline(&ConfigFile::default())?;
    let status = with_timeout(drive(pipeline, settings, RunMode::SingleShot, &[])).await?;

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(status.code(), 0);
    assert!(dir.path().join("_output").is_dir());
    assert!(!stale.exists());
    Ok(())
}

#[tokio::test]
async fn single_shot_failure_exits_non_zero() -> TestResult {
    init_tracing();
    let (_dir, settings) = site()?;

    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Arc::new(RecordingStage::new("start", log.clone())) as Arc<dyn Stage>,
        Arc::new(RecordingStage::failing("render", log.clone())),
        Arc::new(RecordingStage::new("stop", log.clone())),
    ]);

    let status = with_timeout(drive(pipeline, settings, RunMode::SingleShot, &[])).await?;

    assert_eq!(status, ExitStatus::Failure);
    assert_ne!(status.code(), 0);
    assert_eq!(calls(&log), vec!["start@1", "render@1"]);
    Ok(())
}

#[tokio::test]
async fn monitor_mode_reruns_after_a_change_even_when_runs_fail() -> TestResult {
    init_tracing();
    let (dir, settings) = site()?;
    let views = dir.path().join("views");

    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Arc::new(RecordingStage::new("start", log.clone())) as Arc<dyn Stage>,
        Arc::new(RecordingStage::failing("render", log.clone())),
    ]);

    let roots = vec![views.clone()];
    let handle = tokio::spawn(async move { drive(pipeline, settings, RunMode::Monitor, &roots).await });

    with_timeout(wait_until(|| calls(&log).len() == 2)).await;
    // Give the watcher a moment to be fully registered before touching files.
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(views.join("index.html"), "<h1>hi</h1>")?;

    with_timeout(wait_until(|| calls(&log).iter().any(|c| c.starts_with("start@2")))).await;
    assert!(!handle.is_finished(), "monitor mode must keep running after failures");

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn single_shot_panicking_stage_is_reported_as_failure() -> TestResult {
    init_tracing();
    let (_dir, settings) = site()?;

    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Arc::new(RecordingStage::new("start", log.clone())) as Arc<dyn Stage>,
        Arc::new(Explode),
        Arc::new(RecordingStage::new("stop", log.clone())),
    ]);

    let status = with_timeout(drive(pipeline, settings, RunMode::SingleShot, &[])).await?;

    assert_eq!(status, ExitStatus::Failure);
    assert_eq!(calls(&log), vec!["start@1"]);
    Ok(())
}

#[tokio::test]
async fn monitor_mode_survives_a_panicking_stage() -> TestResult {
    init_tracing();
    let (dir, settings) = site()?;
    let views = dir.path().join("views");

    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Arc::new(RecordingStage::new("start", log.clone())) as Arc<dyn Stage>,
        Arc::new(Explode),
    ]);

    let roots = vec![views.clone()];
    let handle = tokio::spawn(async move { drive(pipeline, settings, RunMode::Monitor, &roots).await });

    with_timeout(wait_until(|| calls(&log).len() == 1)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(views.join("index.html"), "<h1>hi</h1>")?;

    with_timeout(wait_until(|| calls(&log).iter().any(|c| c == "start@2"))).await;
    assert!(!handle.is_finished());

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn monitor_mode_does_not_rerun_when_stages_only_read_inputs() -> TestResult {
    init_tracing();
    let (dir, settings) = site()?;
    let views = dir.path().join("views");
    std::fs::write(views.join("index.html"), "<h1>home</h1>")?;

    let runs = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new(vec![Arc::new(ReadTemplate { runs: runs.clone() }) as Arc<dyn Stage>]);

    let roots = vec![views.clone()];
    let handle = tokio::spawn(async move { drive(pipeline, settings, RunMode::Monitor, &roots).await });

    with_timeout(wait_until(|| runs.load(Ordering::SeqCst) >= 1)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1, "reads must not trigger reruns");

    handle.abort();
    Ok(())
}
