// kiln/src/stages/validate.rs

//! Required-field checks over front matter, reported all at once.

use crate::core::context::BuildContext;
use crate::core::matcher::Matcher;
use crate::core::metadata::parse_date;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Rule {
  Present(String),
  Date(String),
}

impl Rule {
  fn key(&self) -> &str {
    match self {
      Rule::Present(k) | Rule::Date(k) => k,
    }
  }
}

/// Checks that matching records carry required metadata.
///
/// Every matching file is checked before failing, and the resulting
/// `Validation` error lists all problems, ordered by path and then by key.
#[derive(Debug, Clone)]
pub struct Validate {
  matcher: Matcher,
  rules: Vec<Rule>,
}

impl Validate {
  pub fn new(pattern: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      rules: Vec::new(),
    })
  }

  /// `key` must be present and non-null.
  pub fn require(mut self, key: impl Into<String>) -> Self {
    self.rules.push(Rule::Present(key.into()));
    self
  }

  /// `key` must be present and parse as a date.
  pub fn require_date(mut self, key: impl Into<String>) -> Self {
    self.rules.push(Rule::Date(key.into()));
    self
  }
}

#[async_trait]
impl Stage for Validate {
  fn name(&self) -> &str {
    "validate"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    let mut rules = self.rules.clone();
    rules.sort_by(|a, b| a.key().cmp(b.key()));

    let mut failing = Vec::new();
    let mut problems = Vec::new();
    for path in files.matching(&self.matcher) {
      let Some(record) = files.get(&path) else {
        continue;
      };
      let mut file_problems = Vec::new();
      for rule in &rules {
        match (rule, record.get_set(rule.key())) {
          (_, None) => file_problems.push(format!("missing '{}'", rule.key())),
          (Rule::Date(key), Some(value)) if parse_date(value).is_none() => {
            file_problems.push(format!("'{key}' is not a valid date"))
          }
          _ => {}
        }
      }
      file_problems.dedup();
      if !file_problems.is_empty() {
        problems.push(format!("{path}: {}", file_problems.join(", ")));
        failing.push(path);
      }
    }

    if failing.is_empty() {
      return Ok(());
    }
    event!(Level::ERROR, num_failing = failing.len(), "Metadata validation failed.");
    Err(KilnError::Validation {
      path: failing.join(", "),
      message: problems.join("; "),
    })
  }
}
