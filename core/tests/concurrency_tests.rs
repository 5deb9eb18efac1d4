// tests/concurrency_tests.rs
mod common;

use common::*;
use kiln::concurrent::try_for_each_file;
use kiln::{from_async_fn, BuildContext, FileStore, KilnError, Pipeline};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn many_files(n: usize) -> FileStore {
  let entries: Vec<(String, String)> = (0..n).map(|i| (format!("f{i:02}.txt"), format!("file {i}"))).collect();
  let borrowed: Vec<(&str, &str)> = entries.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
  store(&borrowed)
}

#[tokio::test]
#[serial]
async fn test_fan_out_respects_limit_and_collects_every_result() {
  setup_tracing();
  let files = many_files(12);
  let paths = files.paths();
  let in_flight = Arc::new(AtomicUsize::new(0));
  let peak = Arc::new(AtomicUsize::new(0));

  let results = try_for_each_file(&files, &paths, 3, |path, record| {
    let in_flight = in_flight.clone();
    let peak = peak.clone();
    async move {
      let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
      peak.fetch_max(now, Ordering::SeqCst);
      tokio::time::sleep(Duration::from_millis(10)).await;
      in_flight.fetch_sub(1, Ordering::SeqCst);
      Ok(format!("{path}:{}", record.contents.len()))
    }
  })
  .await
  .unwrap();

  assert_eq!(results.len(), 12);
  assert_eq!(results["f00.txt"], "f00.txt:6");
  assert!(peak.load(Ordering::SeqCst) <= 3);
  assert!(peak.load(Ordering::SeqCst) >= 2, "expected some overlap");
}

#[tokio::test]
#[serial]
async fn test_fan_out_fails_fast() {
  setup_tracing();
  let files = many_files(20);
  let paths = files.paths();
  let started = Arc::new(AtomicUsize::new(0));

  let result = try_for_each_file(&files, &paths, 2, |path, _record| {
    let started = started.clone();
    async move {
      started.fetch_add(1, Ordering::SeqCst);
      if path == "f01.txt" {
        return Err(KilnError::Validation {
          path,
          message: "bad file".into(),
        });
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
      Ok(())
    }
  })
  .await;

  assert!(matches!(result, Err(KilnError::Validation { path, .. }) if path == "f01.txt"));
  assert!(started.load(Ordering::SeqCst) < 20);
}

#[tokio::test]
#[serial]
async fn test_fan_out_reports_unknown_paths_before_running() {
  setup_tracing();
  let files = many_files(2);
  let calls = AtomicUsize::new(0);
  let paths = vec!["f00.txt".to_string(), "missing.txt".to_string()];

  let result = try_for_each_file(&files, &paths, 0, |_path, _record| {
    calls.fetch_add(1, Ordering::SeqCst);
    async { Ok(()) }
  })
  .await;

  assert!(matches!(result, Err(KilnError::MissingFile { path }) if path == "missing.txt"));
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_stage_using_fan_out_completes_before_next_stage() {
  setup_tracing();
  let mut pipeline = Pipeline::new();
  pipeline
    .use_stage(from_async_fn("shout", |files, _ctx| {
      Box::pin(async move {
        let paths = files.paths();
        let upper = try_for_each_file(files, &paths, 4, |_path, record| async move {
          tokio::time::sleep(Duration::from_millis(5)).await;
          Ok(record.text().unwrap_or_default().to_uppercase())
        })
        .await?;
        for (path, text) in upper {
          if let Some(record) = files.get_mut(&path) {
            record.set_text(text);
          }
        }
        Ok::<(), KilnError>(())
      })
    }))
    .use_stage(Recorder::new("after"));

  let mut files = many_files(8);
  pipeline.run(&mut files, &mut BuildContext::default()).await.unwrap();

  assert!(files.iter().all(|(_, r)| r.text().is_some_and(|t| t.starts_with("FILE"))));
}
