// kiln/src/stages/text.rs

//! Stages that derive metadata from a file's text.

use crate::core::context::BuildContext;
use crate::core::matcher::Matcher;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use tracing::{event, Level};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static FIRST_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strips tags, decodes HTML entities and collapses whitespace.
pub fn sanitize(html: &str) -> String {
  let stripped = TAG.replace_all(html, " ");
  let decoded = html_escape::decode_html_entities(&stripped);
  WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

pub fn word_count(text: &str) -> usize {
  TAG.replace_all(text, " ").split_whitespace().count()
}

fn is_html(path: &str) -> bool {
  let lower = path.to_ascii_lowercase();
  lower.ends_with(".html") || lower.ends_with(".htm")
}

/// The first paragraph of `text`: the first `<p>` element for HTML, the
/// first blank-line separated block otherwise.
pub fn first_paragraph<'a>(path: &str, text: &'a str) -> Option<Cow<'a, str>> {
  if is_html(path) {
    return FIRST_PARAGRAPH
      .captures(text)
      .and_then(|c| c.get(1))
      .map(|m| Cow::Borrowed(m.as_str()));
  }
  let normalized = text.replace("\r\n", "\n");
  normalized
    .split("\n\n")
    .map(str::trim)
    .find(|block| !block.is_empty())
    .map(|block| Cow::Owned(block.to_string()))
}

pub const READING_TIME_KEY: &str = "readingTime";

/// Sets `readingTime` to `"<n> min read"`, rounding up and never below one
/// minute. Tags are not counted as words.
#[derive(Debug, Clone)]
pub struct ReadingTime {
  matcher: Matcher,
  words_per_minute: usize,
}

impl ReadingTime {
  pub fn new(pattern: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      words_per_minute: 200,
    })
  }

  pub fn words_per_minute(mut self, wpm: usize) -> Self {
    self.words_per_minute = wpm.max(1);
    self
  }

  pub fn minutes(&self, words: usize) -> usize {
    words.div_ceil(self.words_per_minute).max(1)
  }
}

#[async_trait]
impl Stage for ReadingTime {
  fn name(&self) -> &str {
    "reading-time"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    for path in files.matching(&self.matcher) {
      let Some(record) = files.get_mut(&path) else {
        continue;
      };
      let Some(words) = record.text().map(word_count) else {
        event!(Level::TRACE, %path, "Skipping non-text file.");
        continue;
      };
      record.insert(READING_TIME_KEY, format!("{} min read", self.minutes(words)));
    }
    Ok(())
  }
}

pub const EXCERPT_KEY: &str = "excerpt";

/// Sets `excerpt` from the file's first paragraph, as plain text.
///
/// Records that already have an excerpt keep it. Files without a
/// non-empty paragraph are left alone.
#[derive(Debug, Clone)]
pub struct Excerpts {
  matcher: Matcher,
}

impl Excerpts {
  pub fn new(pattern: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
    })
  }
}

#[async_trait]
impl Stage for Excerpts {
  fn name(&self) -> &str {
    "excerpts"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    for path in files.matching(&self.matcher) {
      let Some(record) = files.get_mut(&path) else {
        continue;
      };
      if record.get_set(EXCERPT_KEY).is_some() {
        continue;
      }
      let excerpt = record
        .text()
        .and_then(|text| first_paragraph(&path, text))
        .map(|p| sanitize(&p))
        .filter(|e| !e.is_empty());
      if let Some(excerpt) = excerpt {
        record.insert(EXCERPT_KEY, excerpt);
      }
    }
    Ok(())
  }
}
