// kiln/src/core/matcher.rs

//! Glob matching over store paths.

use crate::error::{KilnError, KilnResult};
use glob::{MatchOptions, Pattern};
use std::fmt;

const OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  // `*` stays inside one path segment; only `**` crosses directories.
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

/// A compiled set of glob patterns. A path matches if any pattern matches.
#[derive(Clone)]
pub struct Matcher {
  patterns: Vec<Pattern>,
}

impl Matcher {
  pub fn new(pattern: &str) -> KilnResult<Self> {
    Self::any([pattern])
  }

  pub fn any<I, S>(patterns: I) -> KilnResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let patterns = patterns
      .into_iter()
      .map(|p| {
        let p = p.as_ref();
        Pattern::new(p).map_err(|source| KilnError::InvalidPattern {
          pattern: p.to_string(),
          source,
        })
      })
      .collect::<KilnResult<Vec<_>>>()?;
    Ok(Self { patterns })
  }

  /// A matcher that matches nothing.
  pub fn none() -> Self {
    Self { patterns: Vec::new() }
  }

  pub fn is_empty(&self) -> bool {
    self.patterns.is_empty()
  }

  pub fn is_match(&self, path: &str) -> bool {
    self.patterns.iter().any(|p| p.matches_with(path, OPTIONS))
  }

  pub fn patterns(&self) -> impl Iterator<Item = &str> {
    self.patterns.iter().map(Pattern::as_str)
  }
}

impl fmt::Debug for Matcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.patterns()).finish()
  }
}

impl fmt::Display for Matcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let joined: Vec<&str> = self.patterns().collect();
    f.write_str(&joined.join(","))
  }
}
