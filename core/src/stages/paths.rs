// kiln/src/stages/paths.rs

//! Stages that move or duplicate records under new paths.

use crate::core::context::BuildContext;
use crate::core::matcher::Matcher;
use crate::core::stage::Stage;
use crate::core::store::{normalize_path, FileStore};
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, Level};

type PathFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Lowercases the extension of the last path segment: `img/A.JPG` -> `img/A.jpg`.
pub fn lowercase_extension(path: &str) -> String {
  let name_start = path.rfind('/').map_or(0, |i| i + 1);
  match path[name_start..].rfind('.') {
    Some(dot) if dot > 0 => {
      let split = name_start + dot;
      format!("{}{}", &path[..split], path[split..].to_lowercase())
    }
    _ => path.to_string(),
  }
}

/// Moves each matching record to the path computed by `to`.
///
/// Paths are processed in key order. Moving onto a path that already holds a
/// different record fails the stage with `PathCollision`.
#[derive(Clone)]
pub struct Rename {
  matcher: Matcher,
  to: PathFn,
}

impl Rename {
  pub fn new<F>(pattern: &str, to: F) -> KilnResult<Self>
  where
    F: Fn(&str) -> String + Send + Sync + 'static,
  {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      to: Arc::new(to),
    })
  }

  /// Renames every file so its extension is lowercase.
  pub fn lowercase_extensions() -> KilnResult<Self> {
    Self::new("**/*", lowercase_extension)
  }
}

impl std::fmt::Debug for Rename {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Rename").field("matcher", &self.matcher).finish_non_exhaustive()
  }
}

#[async_trait]
impl Stage for Rename {
  fn name(&self) -> &str {
    "rename"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    for from in files.matching(&self.matcher) {
      let to = normalize_path(&(self.to)(&from));
      if to == from {
        continue;
      }
      if files.contains(&to) {
        return Err(KilnError::PathCollision { from, to });
      }
      event!(Level::TRACE, %from, %to, "Renaming file.");
      files.rename(&from, &to)?;
    }
    Ok(())
  }
}

/// Duplicates each matching record under the path computed by `to`.
///
/// The copy fails with `PathCollision` if the target already exists.
#[derive(Clone)]
pub struct Copy {
  matcher: Matcher,
  to: PathFn,
}

impl Copy {
  pub fn new<F>(pattern: &str, to: F) -> KilnResult<Self>
  where
    F: Fn(&str) -> String + Send + Sync + 'static,
  {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      to: Arc::new(to),
    })
  }
}

impl std::fmt::Debug for Copy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Copy").field("matcher", &self.matcher).finish_non_exhaustive()
  }
}

#[async_trait]
impl Stage for Copy {
  fn name(&self) -> &str {
    "copy"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    for from in files.matching(&self.matcher) {
      let to = normalize_path(&(self.to)(&from));
      if files.contains(&to) {
        return Err(KilnError::PathCollision { from, to });
      }
      let Some(record) = files.get(&from).cloned() else {
        continue;
      };
      event!(Level::TRACE, %from, %to, "Copying file.");
      files.insert(to, record);
    }
    Ok(())
  }
}
