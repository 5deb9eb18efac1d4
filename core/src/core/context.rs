// kiln/src/core/context.rs

//! Defines `BuildContext`, the state shared by every stage of one build run.

use crate::core::matcher::Matcher;
use crate::core::metadata::Metadata;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Shared, mutable state for one build run.
///
/// The context is handed to each stage by `&mut`, so exactly one stage can
/// touch it at a time. Global metadata follows a "last writer wins per key"
/// convention: a stage that publishes a key replaces whatever an earlier
/// stage put there.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
  metadata: Metadata,
  source: PathBuf,
  destination: PathBuf,
}

impl BuildContext {
  pub fn new(metadata: Metadata) -> Self {
    Self {
      metadata,
      ..Default::default()
    }
  }

  pub(crate) fn with_roots(metadata: Metadata, source: PathBuf, destination: PathBuf) -> Self {
    Self {
      metadata,
      source,
      destination,
    }
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  pub fn metadata_mut(&mut self) -> &mut Metadata {
    &mut self.metadata
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.metadata.get(key)
  }

  /// Publishes a global value, replacing any previous one.
  pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.metadata.insert(key.into(), value.into())
  }

  pub fn into_metadata(self) -> Metadata {
    self.metadata
  }

  /// Source root of the build. Empty when the pipeline runs without an I/O boundary.
  pub fn source(&self) -> &Path {
    &self.source
  }

  pub fn destination(&self) -> &Path {
    &self.destination
  }

  /// Compiles `pattern` and returns the matching keys of `files`.
  pub fn match_paths(&self, pattern: &str, files: &FileStore) -> KilnResult<Vec<String>> {
    Ok(files.matching(&Matcher::new(pattern)?))
  }
}
