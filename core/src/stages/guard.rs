// kiln/src/stages/guard.rs

//! Protects literal `{`/`}` in code samples from a templating stage.
//!
//! Template engines treat `{{ ... }}` as syntax even inside code blocks.
//! [`TemplateGuard`] appends a zero-width space after every brace inside
//! code before the wrapped stage runs, then removes the zero-width spaces
//! that follow a brace once it has finished. Zero-width spaces anywhere else
//! are left alone.

use crate::core::context::BuildContext;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{event, Level};

pub const MARKER: char = '\u{200B}';

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]+`").unwrap());
static BRACE_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new("([{}])\u{200B}+").unwrap());
static CODE_ELEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<code(?:\s[^>]*)?>.*?</code\s*>").unwrap());

fn mark_braces(code: &str) -> String {
  let mut out = String::with_capacity(code.len());
  for c in code.chars() {
    out.push(c);
    if c == '{' || c == '}' {
      out.push(MARKER);
    }
  }
  out
}

/// Marks braces inside fenced blocks and inline code spans of Markdown.
pub fn guard_markdown(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut fence: Option<&str> = None;
  for line in text.split_inclusive('\n') {
    let trimmed = line.trim_start();
    let opener = ["```", "~~~"].into_iter().find(|f| trimmed.starts_with(f));
    match (fence, opener) {
      (None, Some(f)) => {
        fence = Some(f);
        out.push_str(line);
      }
      (Some(open), Some(f)) if open == f => {
        fence = None;
        out.push_str(line);
      }
      (Some(_), _) => out.push_str(&mark_braces(line)),
      (None, None) => {
        out.push_str(&INLINE_CODE.replace_all(line, |c: &Captures| mark_braces(&c[0])));
      }
    }
  }
  out
}

/// Marks braces inside `<code>` elements of HTML.
pub fn guard_html(text: &str) -> String {
  CODE_ELEMENT
    .replace_all(text, |c: &Captures| mark_braces(&c[0]))
    .into_owned()
}

/// Removes marker runs directly after `{` or `}`.
pub fn unguard(text: &str) -> String {
  BRACE_MARKERS.replace_all(text, "$1").into_owned()
}

fn is_markdown(path: &str) -> bool {
  path.ends_with(".md")
}

fn is_html(path: &str) -> bool {
  path.ends_with(".html")
}

/// Runs `inner` with code braces hidden from it.
pub struct TemplateGuard<S> {
  name: String,
  inner: S,
}

impl<S: Stage> TemplateGuard<S> {
  pub fn wrap(inner: S) -> Self {
    Self {
      name: format!("guard({})", inner.name()),
      inner,
    }
  }

  pub fn inner(&self) -> &S {
    &self.inner
  }
}

impl<S> std::fmt::Debug for TemplateGuard<S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TemplateGuard").field("name", &self.name).finish_non_exhaustive()
  }
}

fn rewrite_text(files: &mut FileStore, rewrite: impl Fn(&str, &str) -> Option<String>) -> usize {
  let mut touched = 0;
  for (path, record) in files.iter_mut() {
    let Some(updated) = record.text().and_then(|text| rewrite(path, text)) else {
      continue;
    };
    if record.text() != Some(updated.as_str()) {
      record.set_text(updated);
      touched += 1;
    }
  }
  touched
}

#[async_trait]
impl<S: Stage> Stage for TemplateGuard<S> {
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    let guarded = rewrite_text(files, |path, text| {
      if is_markdown(path) {
        Some(guard_markdown(text))
      } else if is_html(path) {
        Some(guard_html(text))
      } else {
        None
      }
    });
    event!(Level::TRACE, guarded, "Guarded template braces.");

    self.inner.run(files, ctx).await?;

    rewrite_text(files, |path, text| {
      let guarded = (is_markdown(path) || is_html(path)) && BRACE_MARKERS.is_match(text);
      guarded.then(|| unguard(text))
    });
    Ok(())
  }
}
