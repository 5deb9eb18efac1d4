// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use kiln::{BuildContext, FileRecord, FileStore, KilnError, KilnResult, Stage};
use serde_json::{json, Value};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

/// Global metadata key where [`Recorder`] stages log their execution.
pub const STEPS_KEY: &str = "steps";

pub fn executed_steps(ctx: &BuildContext) -> Vec<String> {
  match ctx.get(STEPS_KEY) {
    Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
    _ => Vec::new(),
  }
}

fn log_step(ctx: &mut BuildContext, name: &str) {
  let steps = ctx
    .metadata_mut()
    .entry(STEPS_KEY.to_string())
    .or_insert_with(|| Value::Array(Vec::new()));
  if let Value::Array(items) = steps {
    items.push(Value::String(name.to_string()));
  }
}

// --- Common Stages ---

/// Appends its name to the global `steps` list and counts its runs.
pub struct Recorder {
  pub name: String,
  pub runs: Arc<AtomicUsize>,
}

impl Recorder {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      runs: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn runs(&self) -> usize {
    self.runs.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Stage for Recorder {
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, _files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    self.runs.fetch_add(1, Ordering::SeqCst);
    log_step(ctx, &self.name);
    tracing::debug!(target: "test_stages", stage = %self.name, "recorder executed");
    Ok(())
  }
}

/// Logs itself like [`Recorder`], then fails with a `Validation` error.
pub struct Failing {
  pub name: String,
  pub message: String,
}

impl Failing {
  pub fn new(name: &str, message: &str) -> Self {
    Self {
      name: name.to_string(),
      message: message.to_string(),
    }
  }
}

#[async_trait]
impl Stage for Failing {
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, _files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    log_step(ctx, &self.name);
    tracing::warn!(target: "test_stages", stage = %self.name, "failing with: '{}'", self.message);
    Err(KilnError::Validation {
      path: self.name.clone(),
      message: self.message.clone(),
    })
  }
}

/// Appends `suffix` to the text of every file it sees.
pub struct AppendText {
  pub suffix: String,
}

#[async_trait]
impl Stage for AppendText {
  fn name(&self) -> &str {
    "append-text"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    for (_, record) in files.iter_mut() {
      let text = format!("{}{}", record.text().unwrap_or_default(), self.suffix);
      record.set_text(text);
    }
    Ok(())
  }
}

// --- Fixtures ---

pub fn text_file(contents: &str) -> FileRecord {
  FileRecord::new(contents)
}

pub fn post(title: &str, date: &str) -> FileRecord {
  let mut record = FileRecord::new(format!("# {title}\n"));
  record.insert("title", title);
  record.insert("date", date);
  record
}

pub fn store(entries: &[(&str, &str)]) -> FileStore {
  entries
    .iter()
    .map(|(path, contents)| (path.to_string(), text_file(contents)))
    .collect()
}

pub fn string_array(items: &[&str]) -> Value {
  json!(items)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
