// tests/conditional_tests.rs
mod common;

use common::*;
use kiln::{when, BuildContext, Conditional, FileStore, KilnError, Pipeline, Stage};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_disabled_conditional_is_a_no_op() {
  setup_tracing();
  let recorder = Recorder::new("prod-only");
  let runs = recorder.runs.clone();
  let stage = Conditional::new(false, recorder);

  let mut files = store(&[("a.md", "A")]);
  let before = files.clone();
  let mut ctx = BuildContext::default();
  stage.run(&mut files, &mut ctx).await.unwrap();

  assert_eq!(files, before);
  assert!(executed_steps(&ctx).is_empty());
  assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_disabled_conditional_never_runs_a_failing_stage() {
  setup_tracing();
  let stage = when(false, Failing::new("would-fail", "never raised"));
  stage.run(&mut FileStore::new(), &mut BuildContext::default()).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_enabled_conditional_delegates_including_failure() {
  setup_tracing();
  let ok_stage = when(true, AppendText { suffix: "!".into() });
  let mut files = store(&[("a.md", "A")]);
  ok_stage.run(&mut files, &mut BuildContext::default()).await.unwrap();
  assert_eq!(files.get("a.md").unwrap().text(), Some("A!"));

  let failing = when(true, Failing::new("fails", "boom"));
  let err = failing.run(&mut files, &mut BuildContext::default()).await.unwrap_err();
  assert!(matches!(err, KilnError::Validation { message, .. } if message == "boom"));
}

#[tokio::test]
#[serial]
async fn test_use_if_registers_named_conditional_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::new();
  pipeline
    .use_stage(Recorder::new("always"))
    .use_if(false, Recorder::new("minify"))
    .use_if(true, Recorder::new("sitemap"));

  let mut ctx = BuildContext::default();
  pipeline.run(&mut FileStore::new(), &mut ctx).await.unwrap();

  assert_eq!(pipeline.step_names(), vec!["always", "if(minify)", "if(sitemap)"]);
  assert_eq!(executed_steps(&ctx), vec!["always", "sitemap"]);
}

#[tokio::test]
#[serial]
async fn test_failure_inside_enabled_conditional_names_the_wrapper() {
  setup_tracing();
  let mut pipeline = Pipeline::new();
  pipeline.use_if(true, Failing::new("lint", "lint failed"));

  let err = pipeline.run(&mut FileStore::new(), &mut BuildContext::default()).await.unwrap_err();
  assert_eq!(err.failed_stage(), Some("if(lint)"));
}

#[test]
fn test_conditional_accessors() {
  let stage = Conditional::new(true, Recorder::new("inner"));
  assert!(stage.is_enabled());
  assert_eq!(stage.name(), "if(inner)");
  assert_eq!(stage.into_inner().name, "inner");
}
