// kiln/src/io/destination.rs

//! Write phase: persists a `FileStore` under a destination directory.

use crate::core::store::FileStore;
use crate::error::{KilnError, KilnResult};
use std::path::{Component, Path, PathBuf};
use tracing::{event, instrument, Level};

/// Resolves a store key under `root`, rejecting keys that would escape it.
fn output_path(root: &Path, key: &str) -> KilnResult<PathBuf> {
  let rel = Path::new(key);
  let escapes = key.is_empty()
    || rel
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
  if escapes {
    return Err(KilnError::InvalidOutputPath { path: key.to_string() });
  }
  Ok(root.join(rel))
}

/// Removes everything under `root`, keeping the directory itself.
pub fn clean(root: &Path) -> KilnResult<()> {
  if !root.exists() {
    return Ok(());
  }
  let write_err = |path: &Path, source| KilnError::DestinationWrite {
    path: path.to_path_buf(),
    source,
  };
  let entries = std::fs::read_dir(root).map_err(|e| write_err(root, e))?;
  for entry in entries {
    let entry = entry.map_err(|e| write_err(root, e))?;
    let path = entry.path();
    let is_dir = entry.file_type().map_err(|e| write_err(&path, e))?.is_dir();
    let removed = if is_dir {
      std::fs::remove_dir_all(&path)
    } else {
      std::fs::remove_file(&path)
    };
    removed.map_err(|e| write_err(&path, e))?;
  }
  event!(Level::DEBUG, root = %root.display(), "Destination cleaned.");
  Ok(())
}

/// Writes every record of `files` under `root`, creating directories as
/// needed. With `clean_first`, existing destination contents are removed
/// before anything is written. Returns the number of files written.
#[instrument(name = "destination::write_tree", skip_all, fields(root = %root.display(), num_files = files.len()), err(Display))]
pub fn write_tree(root: &Path, files: &FileStore, clean_first: bool) -> KilnResult<usize> {
  // Resolve all paths up front so a bad key fails before the destination is touched.
  let targets = files
    .iter()
    .map(|(key, record)| Ok((output_path(root, key)?, record)))
    .collect::<KilnResult<Vec<_>>>()?;

  if clean_first {
    clean(root)?;
  }
  std::fs::create_dir_all(root).map_err(|source| KilnError::DestinationWrite {
    path: root.to_path_buf(),
    source,
  })?;

  for (path, record) in &targets {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| KilnError::DestinationWrite {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    std::fs::write(path, &record.contents).map_err(|source| KilnError::DestinationWrite {
      path: path.clone(),
      source,
    })?;
    event!(Level::TRACE, path = %path.display(), "Wrote file.");
  }

  Ok(targets.len())
}
