// tests/pipeline_sequencing.rs

mod common;
use crate::common::{call_log, calls, context_for, init_tracing, with_timeout, RecordingStage};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use sitegen::context::RunContext;
use sitegen::pipeline::Pipeline;
use sitegen::stage::{Stage, StageError, StageFuture};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn stages_run_in_declared_order_and_see_earlier_fields() -> TestResult {
    init_tracing();

    let log = call_log();
    let data = RecordingStage::new("data", log.clone());
    let render = RecordingStage::new("render", log.clone());
    let copy = RecordingStage::new("copy", log.clone());
    let seen = render.seen();

    let pipeline = Pipeline::new(vec![
        Arc::new(data) as Arc<dyn Stage>,
        Arc::new(render),
        Arc::new(copy),
    ]);
    assert_eq!(pipeline.stage_names().collect::<Vec<_>>(), vec!["data", "render", "copy"]);

    let ctx = with_timeout(pipeline.run(context_for(1, Path::new("/site")))).await?;

    assert_eq!(calls(&log), vec!["data@1", "render@1", "copy@1"]);
    assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["copy", "data", "render"]);
    assert_eq!(ctx.get("data"), Some(&json!("from data")));
    assert_eq!(ctx.owner_of("render"), Some("render"));
    assert_eq!(ctx.current_stage(), None);

    // render saw data's field, and nothing from itself or later stages.
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, vec![("render".to_string(), vec!["data".to_string()])]);

    Ok(())
}

#[tokio::test]
async fn first_failure_short_circuits_the_rest() -> TestResult {
    init_tracing();

    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Arc::new(RecordingStage::new("clean", log.clone())) as Arc<dyn Stage>,
        Arc::new(RecordingStage::failing("data", log.clone())),
        Arc::new(RecordingStage::new("render", log.clone())),
        Arc::new(RecordingStage::new("stop", log.clone())),
    ]);

    let err = with_timeout(pipeline.run(context_for(4, Path::new("/site"))))
        .await
        .expect_err("pipeline should fail");

    assert_eq!(err.stage, "data");
    assert_eq!(err.index, 1);
    assert_eq!(err.total, 4);
    assert!(matches!(err.source, StageError::Failed { ref message, .. } if message == "data exploded"));
    assert_eq!(calls(&log), vec!["clean@4", "data@4"]);

    Ok(())
}

#[tokio::test]
async fn overwriting_another_stages_field_fails_the_run() -> TestResult {
    init_tracing();

    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Arc::new(RecordingStage::new("data", log.clone())) as Arc<dyn Stage>,
        Arc::new(HijackStage),
    ]);

    let err = with_timeout(pipeline.run(context_for(1, Path::new("/site"))))
        .await
        .expect_err("hijack should fail");

    assert_eq!(err.stage, "hijack");
    assert!(matches!(err.source, StageError::NotOwner { ref owner, .. } if owner == "data"));
    Ok(())
}

/// Tries to overwrite the field written by `data`.
struct HijackStage;

impl Stage for HijackStage {
    fn name(&self) -> &str {
        "hijack"
    }

    fn execute(&self, mut ctx: RunContext) -> StageFuture<'_> {
        Box::pin(async move {
            ctx.set("data", json!("mine now"))?;
            Ok(ctx)
        })
    }
}
