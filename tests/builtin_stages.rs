// tests/builtin_stages.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use sitegen::context::{RunContext, Settings};
use sitegen::stage::{Stage, StageError};
use sitegen::stages::clean::OUTPUT_DIR_FIELD;
use sitegen::stages::start::ENV_FIELD;
use sitegen::stages::{CleanStage, StartStage, StopStage};

type TestResult = Result<(), Box<dyn Error>>;

fn ctx_with(settings: Settings, stage: &str) -> RunContext {
    let mut ctx = RunContext::new(1, Arc::new(settings));
    ctx.enter_stage(stage);
    ctx
}

#[tokio::test]
async fn start_loads_the_env_file_into_the_context() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let env_file = dir.path().join("prod.json");
    std::fs::write(&env_file, r#"{ "SITE_URL": "https://example.org", "DRAFTS": false }"#)?;

    let settings = Settings::new(dir.path()).with_env_file(&env_file);
    let ctx = with_timeout(StartStage.execute(ctx_with(settings, "start"))).await?;

    assert_eq!(
        ctx.get(ENV_FIELD),
        Some(&json!({ "SITE_URL": "https://example.org", "DRAFTS": false }))
    );
    assert_eq!(ctx.owner_of(ENV_FIELD), Some("start"));
    Ok(())
}

#[tokio::test]
async fn start_without_env_file_sets_an_empty_overlay() -> TestResult {
    init_tracing();
    let ctx = with_timeout(StartStage.execute(ctx_with(Settings::new("/site"), "start"))).await?;
    assert_eq!(ctx.get(ENV_FIELD), Some(&json!({})));
    Ok(())
}

#[tokio::test]
async fn start_rejects_env_files_that_are_not_objects() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    let list = dir.path().join("list.json");
    std::fs::write(&list, "[1, 2, 3]")?;
    let settings = Settings::new(dir.path()).with_env_file(&list);
    let err = with_timeout(StartStage.execute(ctx_with(settings, "start")))
        .await
        .expect_err("array env file");
    assert!(err.to_string().contains("must contain a JSON object"));

    let missing = dir.path().join("missing.json");
    let settings = Settings::new(dir.path()).with_env_file(&missing);
    let err = with_timeout(StartStage.execute(ctx_with(settings, "start")))
        .await
        .expect_err("missing env file");
    assert!(matches!(err, StageError::Failed { source: Some(_), .. }));
    Ok(())
}

#[tokio::test]
async fn clean_resets_the_output_directory() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let output = dir.path().join("public");
    std::fs::create_dir_all(output.join("blog"))?;
    std::fs::write(output.join("blog/old.html"), "old")?;

    let settings = Settings::new(dir.path()).with_output_dir(&output);
    let ctx = with_timeout(CleanStage.execute(ctx_with(settings, "clean"))).await?;

    assert!(output.is_dir());
    assert_eq!(std::fs::read_dir(&output)?.count(), 0);
    assert_eq!(
        ctx.get(OUTPUT_DIR_FIELD),
        Some(&json!(output.to_string_lossy()))
    );
    Ok(())
}

#[tokio::test]
async fn clean_refuses_to_delete_the_source_tree() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let source = dir.path().join("site");
    std::fs::create_dir_all(source.join("views"))?;

    let settings = Settings::new(&source).with_output_dir(dir.path());
    let err = with_timeout(CleanStage.execute(ctx_with(settings, "clean")))
        .await
        .expect_err("must refuse");

    assert!(err.to_string().contains("refusing to clean"));
    assert!(source.join("views").is_dir());
    Ok(())
}

#[tokio::test]
async fn stop_passes_the_context_through() -> TestResult {
    init_tracing();
    let mut ctx = ctx_with(Settings::new(Path::new("/site")), "render");
    ctx.set("pages", json!(3))?;
    ctx.enter_stage("stop");

    let ctx = with_timeout(StopStage.execute(ctx)).await?;
    assert_eq!(ctx.get("pages"), Some(&json!(3)));
    Ok(())
}
