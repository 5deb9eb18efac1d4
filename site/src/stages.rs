// kiln/site/src/stages.rs

//! Site-specific stages that are not generic enough for the library.

use anyhow::Context;
use async_trait::async_trait;
use kiln::concurrent::try_for_each_file;
use kiln::{BuildContext, FileStore, KilnError, KilnResult, Matcher, Stage};
use tracing::{event, Level};

/// Converts CRLF and lone CR line endings to LF in matching text files.
///
/// Files are processed on the blocking pool, at most `limit` at a time.
/// Binary (non UTF-8) files are left untouched.
#[derive(Debug, Clone)]
pub struct NormalizeNewlines {
  matcher: Matcher,
  limit: usize,
}

impl NormalizeNewlines {
  pub fn any<I, S>(patterns: I, limit: usize) -> KilnResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Ok(Self {
      matcher: Matcher::any(patterns)?,
      limit,
    })
  }
}

pub fn normalize_newlines(text: &str) -> Option<String> {
  if !text.contains('\r') {
    return None;
  }
  Some(text.replace("\r\n", "\n").replace('\r', "\n"))
}

#[async_trait]
impl Stage for NormalizeNewlines {
  fn name(&self) -> &str {
    "normalize-newlines"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    let paths = files.matching(&self.matcher);
    let results = try_for_each_file(files, &paths, self.limit, |path, record| async move {
      let normalized = tokio::task::spawn_blocking(move || record.text().and_then(normalize_newlines))
        .await
        .with_context(|| format!("normalizing '{path}' panicked"))?;
      Ok::<_, KilnError>(normalized)
    })
    .await?;

    let mut changed = 0;
    for (path, normalized) in results {
      if let (Some(text), Some(record)) = (normalized, files.get_mut(&path)) {
        record.set_text(text);
        changed += 1;
      }
    }
    event!(Level::DEBUG, checked = paths.len(), changed, "Normalized line endings.");
    Ok(())
  }
}
