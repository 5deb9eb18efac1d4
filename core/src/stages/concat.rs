// kiln/src/stages/concat.rs

//! Joins matching files into a single output file.

use crate::core::context::BuildContext;
use crate::core::file::FileRecord;
use crate::core::matcher::Matcher;
use crate::core::stage::Stage;
use crate::core::store::{normalize_path, FileStore};
use crate::error::KilnResult;
use async_trait::async_trait;
use tracing::{event, Level};

/// Joins matching files, in path order and separated by a newline, into a
/// single `output` file.
///
/// Sources are removed unless `keep_sources(true)`. The output path itself is
/// never treated as a source. When nothing matches, no output is produced.
#[derive(Debug, Clone)]
pub struct Concat {
  matcher: Matcher,
  output: String,
  keep_sources: bool,
}

impl Concat {
  pub fn new(pattern: &str, output: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      output: normalize_path(output),
      keep_sources: false,
    })
  }

  pub fn any<I, S>(patterns: I, output: &str) -> KilnResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Ok(Self {
      matcher: Matcher::any(patterns)?,
      output: normalize_path(output),
      keep_sources: false,
    })
  }

  pub fn keep_sources(mut self, keep: bool) -> Self {
    self.keep_sources = keep;
    self
  }
}

#[async_trait]
impl Stage for Concat {
  fn name(&self) -> &str {
    "concat"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    let sources: Vec<String> = files
      .matching(&self.matcher)
      .into_iter()
      .filter(|p| *p != self.output)
      .collect();
    if sources.is_empty() {
      event!(Level::DEBUG, output = %self.output, "Nothing to concatenate.");
      return Ok(());
    }

    let mut contents = Vec::new();
    for (i, path) in sources.iter().enumerate() {
      if i > 0 {
        contents.push(b'\n');
      }
      if let Some(record) = files.get(path) {
        contents.extend_from_slice(&record.contents);
      }
    }

    if !self.keep_sources {
      for path in &sources {
        files.remove(path);
      }
    }
    event!(Level::DEBUG, output = %self.output, num_sources = sources.len(), "Concatenated files.");
    files.insert(&self.output, FileRecord::new(contents));
    Ok(())
  }
}
