// kiln/src/io/source.rs

//! Read phase: turns a directory tree into a `FileStore`.

use crate::core::file::FileRecord;
use crate::core::matcher::Matcher;
use crate::core::store::{normalize_path, FileStore};
use crate::error::{KilnError, KilnResult};
use crate::io::frontmatter;
use std::path::Path;
use tracing::{event, instrument, Level};
use walkdir::WalkDir;

/// Key of `path` relative to `root`, with forward slashes.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
  let rel = path.strip_prefix(root).ok()?;
  let key = normalize_path(&rel.to_string_lossy());
  (!key.is_empty()).then_some(key)
}

/// Builds a record from raw bytes, lifting front matter into metadata when
/// `parse_frontmatter` is set and the file is UTF-8.
pub fn record_from_bytes(path: &Path, bytes: Vec<u8>, parse_frontmatter: bool) -> KilnResult<FileRecord> {
  if !parse_frontmatter {
    return Ok(FileRecord::new(bytes));
  }
  let Ok(text) = std::str::from_utf8(&bytes) else {
    return Ok(FileRecord::new(bytes));
  };
  match frontmatter::split(text) {
    Some((header, body)) => {
      let metadata = frontmatter::parse(header).map_err(|source| KilnError::FrontMatter {
        path: path.to_path_buf(),
        source,
      })?;
      Ok(FileRecord::with_metadata(body.as_bytes().to_vec(), metadata))
    }
    None => Ok(FileRecord::new(bytes)),
  }
}

/// Recursively reads every file under `root` into a store.
///
/// Paths (files or directories) whose relative key matches `ignore` are
/// skipped; an ignored directory is not descended into. Any unreadable entry
/// fails the whole read.
#[instrument(name = "source::read_tree", skip_all, fields(root = %root.display()), err(Display))]
pub fn read_tree(root: &Path, ignore: &Matcher, parse_frontmatter: bool) -> KilnResult<FileStore> {
  if !root.is_dir() {
    return Err(KilnError::SourceRead {
      path: root.to_path_buf(),
      source: std::io::Error::new(std::io::ErrorKind::NotFound, "source root is not a directory"),
    });
  }

  let mut files = FileStore::new();
  let walker = WalkDir::new(root)
    .follow_links(true)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| match relative_key(root, entry.path()) {
      Some(key) => !ignore.is_match(&key),
      None => true, // the root itself
    });

  for entry in walker {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let Some(key) = relative_key(root, entry.path()) else {
      continue;
    };

    let bytes = std::fs::read(entry.path()).map_err(|source| KilnError::SourceRead {
      path: entry.path().to_path_buf(),
      source,
    })?;
    let record = record_from_bytes(entry.path(), bytes, parse_frontmatter)?;
    event!(Level::TRACE, path = %key, bytes = record.contents.len(), "Read source file.");
    files.insert(key, record);
  }

  event!(Level::DEBUG, num_files = files.len(), "Source tree read.");
  Ok(files)
}
