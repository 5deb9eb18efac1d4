// kiln/src/core/store.rs

//! Defines `FileStore`, the ordered path → `FileRecord` mapping every stage operates on.

use crate::core::file::FileRecord;
use crate::core::matcher::Matcher;
use crate::error::{KilnError, KilnResult};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;
use tracing::{event, Level};

/// Normalizes a store key: forward slashes, no `./` segments, no leading or
/// trailing slash, no empty segments.
pub fn normalize_path(path: &str) -> String {
  path
    .replace('\\', "/")
    .split('/')
    .filter(|segment| !segment.is_empty() && *segment != ".")
    .collect::<Vec<_>>()
    .join("/")
}

/// The in-memory virtual file tree.
///
/// Keys are unique normalized relative paths. Iteration order is the key
/// order, which keeps every stage (and the final write) deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileStore {
  files: BTreeMap<String, FileRecord>,
}

impl FileStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Snapshot of the current keys. Safe to iterate while mutating the store.
  pub fn paths(&self) -> Vec<String> {
    self.files.keys().cloned().collect()
  }

  pub fn contains(&self, path: &str) -> bool {
    self.files.contains_key(&normalize_path(path))
  }

  pub fn get(&self, path: &str) -> Option<&FileRecord> {
    self.files.get(&normalize_path(path))
  }

  pub fn get_mut(&mut self, path: &str) -> Option<&mut FileRecord> {
    self.files.get_mut(&normalize_path(path))
  }

  /// Inserts (or replaces) a record, returning the previous one.
  pub fn insert(&mut self, path: impl AsRef<str>, record: FileRecord) -> Option<FileRecord> {
    self.files.insert(normalize_path(path.as_ref()), record)
  }

  pub fn remove(&mut self, path: &str) -> Option<FileRecord> {
    self.files.remove(&normalize_path(path))
  }

  /// Moves a record to a new key. Any record already at `to` is replaced.
  pub fn rename(&mut self, from: &str, to: &str) -> KilnResult<()> {
    let record = self.remove(from).ok_or_else(|| KilnError::MissingFile {
      path: normalize_path(from),
    })?;
    self.insert(to, record);
    Ok(())
  }

  /// Snapshot of the keys matching `matcher`, in key order.
  pub fn matching(&self, matcher: &Matcher) -> Vec<String> {
    self.files.keys().filter(|p| matcher.is_match(p)).cloned().collect()
  }

  /// A new store holding clones of the listed records. Unknown keys are skipped.
  pub fn subset(&self, paths: &[String]) -> FileStore {
    paths
      .iter()
      .filter_map(|p| self.files.get(p).map(|r| (p.clone(), r.clone())))
      .collect()
  }

  /// Folds a scoped store back into this one.
  ///
  /// Keys in `scope` that are gone from `scoped` are deleted here; every
  /// record in `scoped` is inserted, replacing whatever was at that key.
  /// Returns the keys that were written over records outside `scope`.
  pub fn merge_scoped(&mut self, scope: &[String], scoped: FileStore) -> Vec<String> {
    let scope: BTreeSet<&str> = scope.iter().map(String::as_str).collect();
    for path in &scope {
      if !scoped.files.contains_key(*path) {
        event!(Level::TRACE, %path, "Removing file deleted inside scope.");
        self.files.remove(*path);
      }
    }

    let mut overwritten = Vec::new();
    for (path, record) in scoped.files {
      if self.files.contains_key(&path) && !scope.contains(path.as_str()) {
        overwritten.push(path.clone());
      }
      self.files.insert(path, record);
    }
    overwritten
  }

  pub fn iter(&self) -> btree_map::Iter<'_, String, FileRecord> {
    self.files.iter()
  }

  pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, FileRecord> {
    self.files.iter_mut()
  }

  pub fn retain(&mut self, mut keep: impl FnMut(&str, &FileRecord) -> bool) {
    self.files.retain(|path, record| keep(path, record));
  }
}

impl FromIterator<(String, FileRecord)> for FileStore {
  fn from_iter<I: IntoIterator<Item = (String, FileRecord)>>(iter: I) -> Self {
    let mut store = FileStore::new();
    for (path, record) in iter {
      store.insert(path, record);
    }
    store
  }
}

impl IntoIterator for FileStore {
  type Item = (String, FileRecord);
  type IntoIter = btree_map::IntoIter<String, FileRecord>;

  fn into_iter(self) -> Self::IntoIter {
    self.files.into_iter()
  }
}

impl<'a> IntoIterator for &'a FileStore {
  type Item = (&'a String, &'a FileRecord);
  type IntoIter = btree_map::Iter<'a, String, FileRecord>;

  fn into_iter(self) -> Self::IntoIter {
    self.files.iter()
  }
}
