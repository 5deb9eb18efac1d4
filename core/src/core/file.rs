// kiln/src/core/file.rs

//! Defines `FileRecord`, one virtual file held by the `FileStore`.

use crate::core::metadata::Metadata;
use serde_json::Value;

/// One virtual file: raw byte contents plus an open-ended metadata map.
///
/// The record does not know its own path; the path is the key under which the
/// `FileStore` holds it. Moving a file is therefore always a remove followed
/// by an insert on the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
  pub contents: Vec<u8>,
  pub metadata: Metadata,
}

impl FileRecord {
  pub fn new(contents: impl Into<Vec<u8>>) -> Self {
    Self {
      contents: contents.into(),
      metadata: Metadata::new(),
    }
  }

  pub fn with_metadata(contents: impl Into<Vec<u8>>, metadata: Metadata) -> Self {
    Self {
      contents: contents.into(),
      metadata,
    }
  }

  /// Contents as UTF-8, or `None` for binary files.
  pub fn text(&self) -> Option<&str> {
    std::str::from_utf8(&self.contents).ok()
  }

  pub fn set_text(&mut self, text: impl Into<String>) {
    self.contents = text.into().into_bytes();
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.metadata.get(key)
  }

  /// Returns the value only if it is present and not `null`.
  pub fn get_set(&self, key: &str) -> Option<&Value> {
    self.metadata.get(key).filter(|v| !v.is_null())
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.metadata.get(key).and_then(Value::as_str)
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.metadata.insert(key.into(), value.into())
  }

  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.metadata.remove(key)
  }

  /// Truthiness in the loose sense front matter authors expect:
  /// `true`, non-zero numbers and the strings "true"/"yes" count as set.
  pub fn flag(&self, key: &str) -> bool {
    match self.metadata.get(key) {
      Some(Value::Bool(b)) => *b,
      Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
      Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
      _ => false,
    }
  }
}
