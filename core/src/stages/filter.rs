// kiln/src/stages/filter.rs

//! Stages that drop files or metadata keys.

use crate::core::context::BuildContext;
use crate::core::matcher::Matcher;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use tracing::{event, Level};

/// Removes every file matching any of the patterns.
#[derive(Debug, Clone)]
pub struct Ignore {
  matcher: Matcher,
}

impl Ignore {
  pub fn new<I, S>(patterns: I) -> KilnResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Ok(Self {
      matcher: Matcher::any(patterns)?,
    })
  }
}

#[async_trait]
impl Stage for Ignore {
  fn name(&self) -> &str {
    "ignore"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    let before = files.len();
    files.retain(|path, _| !self.matcher.is_match(path));
    event!(Level::DEBUG, patterns = %self.matcher, removed = before - files.len(), "Ignored files.");
    Ok(())
  }
}

/// Removes records whose `draft` flag is set.
#[derive(Debug, Clone, Default)]
pub struct Drafts {
  include: bool,
}

impl Drafts {
  pub fn new() -> Self {
    Self::default()
  }

  /// Keep drafts in the output (useful for local previews).
  pub fn include_drafts(mut self, include: bool) -> Self {
    self.include = include;
    self
  }
}

#[async_trait]
impl Stage for Drafts {
  fn name(&self) -> &str {
    "drafts"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    if self.include {
      return Ok(());
    }
    let before = files.len();
    files.retain(|_, record| !record.flag("draft"));
    event!(Level::DEBUG, removed = before - files.len(), "Dropped drafts.");
    Ok(())
  }
}

/// Deletes the given metadata keys from every record.
#[derive(Debug, Clone)]
pub struct Except {
  keys: Vec<String>,
}

impl Except {
  pub fn new<I, S>(keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      keys: keys.into_iter().map(Into::into).collect(),
    }
  }
}

#[async_trait]
impl Stage for Except {
  fn name(&self) -> &str {
    "except"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    for (_, record) in files.iter_mut() {
      for key in &self.keys {
        record.remove(key);
      }
    }
    Ok(())
  }
}
