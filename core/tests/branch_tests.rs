// tests/branch_tests.rs
mod common;

use common::*;
use kiln::{from_fn, Branch, BuildContext, FileRecord, FileStore, KilnError, Pipeline, Stage};
use serde_json::json;
use serial_test::serial;
use std::sync::{Arc, Mutex};

#[tokio::test]
#[serial]
async fn test_branch_only_sees_matching_files() {
  setup_tracing();
  let seen = Arc::new(Mutex::new(Vec::new()));
  let seen_in_stage = seen.clone();

  let branch = Branch::new("blog/**/*.md").unwrap().use_stage(from_fn("peek", move |files, _ctx| {
    seen_in_stage.lock().unwrap().extend(files.paths());
    Ok(())
  }));

  let mut files = store(&[
    ("blog/a.md", "A"),
    ("blog/2024/b.md", "B"),
    ("blog/c.txt", "C"),
    ("index.md", "I"),
  ]);
  branch.run(&mut files, &mut BuildContext::default()).await.unwrap();

  assert_eq!(*seen.lock().unwrap(), vec!["blog/2024/b.md", "blog/a.md"]);
  assert_eq!(files.len(), 4);
}

#[tokio::test]
#[serial]
async fn test_branch_merges_mutations_back() {
  setup_tracing();
  let branch = Branch::new("*.md").unwrap().use_stage(AppendText { suffix: "!".into() });

  let mut files = store(&[("a.md", "A"), ("b.txt", "B")]);
  branch.run(&mut files, &mut BuildContext::default()).await.unwrap();

  assert_eq!(files.get("a.md").unwrap().text(), Some("A!"));
  assert_eq!(files.get("b.txt").unwrap().text(), Some("B"));
}

#[tokio::test]
#[serial]
async fn test_branch_deletions_and_additions_propagate() {
  setup_tracing();
  let branch = Branch::new("drafts/*").unwrap().use_stage(from_fn("publish", |files, _ctx| {
    files.remove("drafts/old.md");
    files.rename("drafts/new.md", "posts/new.md")?;
    Ok(())
  }));

  let mut files = store(&[("drafts/old.md", "old"), ("drafts/new.md", "new"), ("about.md", "about")]);
  branch.run(&mut files, &mut BuildContext::default()).await.unwrap();

  assert_eq!(files.paths(), vec!["about.md", "posts/new.md"]);
  assert_eq!(files.get("posts/new.md").unwrap().text(), Some("new"));
}

#[tokio::test]
#[serial]
async fn test_branch_shares_global_metadata() {
  setup_tracing();
  let branch = Branch::new("*.md").unwrap().use_stage(from_fn("count", |files, ctx| {
    ctx.set("markdown_count", files.len());
    Ok(())
  }));

  let mut files = store(&[("a.md", "A"), ("b.md", "B"), ("c.css", "C")]);
  let mut ctx = BuildContext::default();
  branch.run(&mut files, &mut ctx).await.unwrap();

  assert_eq!(ctx.get("markdown_count"), Some(&json!(2)));
}

#[tokio::test]
#[serial]
async fn test_failed_branch_leaves_parent_untouched() {
  setup_tracing();
  let branch = Branch::new("*.md")
    .unwrap()
    .use_stage(AppendText { suffix: " changed".into() })
    .use_stage(from_fn("drop-all", |files, _ctx| {
      *files = FileStore::new();
      Ok(())
    }))
    .use_stage(Failing::new("explode", "nested stage failed"));

  let mut files = store(&[("a.md", "A"), ("b.txt", "B")]);
  let before = files.clone();
  let err = branch.run(&mut files, &mut BuildContext::default()).await.unwrap_err();

  assert!(matches!(&err, KilnError::StageFailed { stage, index: 2, .. } if stage == "explode"));
  assert_eq!(files, before);
}

#[tokio::test]
#[serial]
async fn test_branch_output_wins_over_out_of_scope_file() {
  setup_tracing();
  let branch = Branch::new("src/*.md").unwrap().use_stage(from_fn("flatten", |files, _ctx| {
    files.rename("src/index.md", "index.md")?;
    Ok(())
  }));

  let mut files = store(&[("src/index.md", "from branch"), ("index.md", "original")]);
  branch.run(&mut files, &mut BuildContext::default()).await.unwrap();

  assert_eq!(files.paths(), vec!["index.md"]);
  assert_eq!(files.get("index.md").unwrap().text(), Some("from branch"));
}

#[tokio::test]
#[serial]
async fn test_branch_with_no_matches_still_runs_nested_stages() {
  setup_tracing();
  let recorder = Recorder::new("nested");
  let runs = recorder.runs.clone();
  let branch = Branch::new("*.nothing").unwrap().use_stage(recorder);

  let mut files = store(&[("a.md", "A")]);
  branch.run(&mut files, &mut BuildContext::default()).await.unwrap();

  assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 1);
  assert_eq!(files.paths(), vec!["a.md"]);
}

#[tokio::test]
#[serial]
async fn test_nested_branches_and_pipeline_registration() {
  setup_tracing();
  let inner = Branch::new("blog/*.md").unwrap().use_stage(AppendText { suffix: "+inner".into() });
  let outer = Branch::any(["blog/*", "pages/*"]).unwrap().use_stage(AppendText { suffix: "+outer".into() }).use_stage(inner);

  let mut pipeline = Pipeline::new();
  pipeline.use_stage(outer);

  let mut files = FileStore::new();
  files.insert("blog/a.md", FileRecord::new("a"));
  files.insert("blog/a.css", FileRecord::new("c"));
  files.insert("pages/p.md", FileRecord::new("p"));
  files.insert("other.md", FileRecord::new("o"));
  pipeline.run(&mut files, &mut BuildContext::default()).await.unwrap();

  assert_eq!(files.get("blog/a.md").unwrap().text(), Some("a+outer+inner"));
  assert_eq!(files.get("blog/a.css").unwrap().text(), Some("c+outer"));
  assert_eq!(files.get("pages/p.md").unwrap().text(), Some("p+outer"));
  assert_eq!(files.get("other.md").unwrap().text(), Some("o"));
}

#[test]
fn test_invalid_branch_pattern_is_rejected_at_construction() {
  let err = Branch::new("blog/[").unwrap_err();
  assert!(matches!(err, KilnError::InvalidPattern { .. }));

  let branch = Branch::new("blog/*.md").unwrap().use_stage(Recorder::new("nested"));
  let debug = format!("{branch:?}");
  assert!(debug.contains("branch(blog/*.md)"));
  assert!(debug.contains("nested"));
}
