// kiln/src/stages/paginate.rs

//! Synthesizes index pages for published collections.
//!
//! Each selected collection is cut into pages of `per_page` members. Every
//! page becomes an empty record whose `pagination` object lists its members
//! and links to its neighbours by store path, ready for a later layout stage
//! to render.

use crate::core::context::BuildContext;
use crate::core::file::FileRecord;
use crate::core::metadata::Metadata;
use crate::core::stage::Stage;
use crate::core::store::{normalize_path, FileStore};
use crate::error::{KilnError, KilnResult};
use crate::stages::collections::{published, COLLECTIONS_KEY};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::{event, Level};

pub const PAGINATION_KEY: &str = "pagination";

const COLLECTION_SLOT: &str = "{collection}";
const NUM_SLOT: &str = "{num}";

/// Paginates collections found under `collections.<name>`.
///
/// Page paths come from a template with `{collection}` and `{num}` slots,
/// e.g. `{collection}/{num}/index.html`. With `first(..)` page one is also
/// written to that path; adding `no_page_one(true)` makes it the only copy.
/// Empty collections produce no pages.
///
/// A page landing on a path that already exists fails the stage before any
/// page is inserted.
#[derive(Debug, Clone)]
pub struct Paginate {
  only: Option<BTreeSet<String>>,
  per_page: usize,
  path: String,
  first: Option<String>,
  no_page_one: bool,
  page_metadata: Metadata,
}

struct Page {
  path: String,
  record: FileRecord,
}

impl Paginate {
  /// Paginates every published collection. `path` must contain `{num}`.
  pub fn new(path: impl Into<String>) -> KilnResult<Self> {
    let path = path.into();
    if !path.contains(NUM_SLOT) {
      return Err(KilnError::Configuration {
        message: format!("pagination path '{path}' has no {NUM_SLOT} slot"),
      });
    }
    Ok(Self {
      only: None,
      per_page: 10,
      path,
      first: None,
      no_page_one: false,
      page_metadata: Metadata::new(),
    })
  }

  /// Restricts pagination to the named collections.
  pub fn only<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.only = Some(names.into_iter().map(Into::into).collect());
    self
  }

  /// Members per page, at least one.
  pub fn per_page(mut self, per_page: usize) -> Self {
    self.per_page = per_page.max(1);
    self
  }

  pub fn first(mut self, path: impl Into<String>) -> Self {
    self.first = Some(path.into());
    self
  }

  /// Skips the numbered copy of page one. Only has an effect with `first`.
  pub fn no_page_one(mut self, skip: bool) -> Self {
    self.no_page_one = skip;
    self
  }

  /// Metadata copied onto every generated page.
  pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.page_metadata.insert(key.into(), value.into());
    self
  }

  fn page_path(&self, template: &str, collection: &str, num: usize) -> String {
    normalize_path(
      &template
        .replace(COLLECTION_SLOT, collection)
        .replace(NUM_SLOT, &num.to_string()),
    )
  }

  /// Path a page is linked under: the `first` path for page one when set.
  fn canonical_path(&self, collection: &str, num: usize) -> String {
    match (&self.first, num) {
      (Some(first), 1) => self.page_path(first, collection, num),
      _ => self.page_path(&self.path, collection, num),
    }
  }

  fn plan(&self, collection: &str, members: &[String]) -> Vec<Page> {
    let chunks: Vec<&[String]> = members.chunks(self.per_page).collect();
    let total = chunks.len();
    let link = |num: usize| -> Value {
      if num >= 1 && num <= total {
        Value::String(self.canonical_path(collection, num))
      } else {
        Value::Null
      }
    };

    let mut pages = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
      let num = index + 1;
      let mut metadata = self.page_metadata.clone();
      metadata.insert(
        PAGINATION_KEY.to_string(),
        json!({
          "collection": collection,
          "num": num,
          "index": index,
          "pages": total,
          "files": chunk,
          "path": link(num),
          "first": link(1),
          "last": link(total),
          "previous": link(index),
          "next": link(num + 1),
        }),
      );

      let mut paths = Vec::new();
      if num == 1 {
        if let Some(first) = &self.first {
          paths.push(self.page_path(first, collection, num));
        }
      }
      if !(num == 1 && self.first.is_some() && self.no_page_one) {
        paths.push(self.page_path(&self.path, collection, num));
      }
      for path in paths {
        pages.push(Page {
          path,
          record: FileRecord::with_metadata(Vec::new(), metadata.clone()),
        });
      }
    }
    pages
  }
}

#[async_trait]
impl Stage for Paginate {
  fn name(&self) -> &str {
    "paginate"
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    let mut pages = Vec::new();
    for (name, members) in published(ctx) {
      if self.only.as_ref().is_some_and(|only| !only.contains(&name)) {
        continue;
      }
      let planned = self.plan(&name, &members);
      event!(Level::DEBUG, collection = %name, members = members.len(), pages = planned.len(), "Planned pagination.");
      pages.extend(planned.into_iter().map(|page| (name.clone(), page)));
    }

    let mut claimed = BTreeSet::new();
    for (name, page) in &pages {
      if files.contains(&page.path) || !claimed.insert(page.path.as_str()) {
        return Err(KilnError::PathCollision {
          from: format!("{COLLECTIONS_KEY}.{name}"),
          to: page.path.clone(),
        });
      }
    }

    let generated = pages.len();
    for (_, page) in pages {
      files.insert(page.path, page.record);
    }
    event!(Level::DEBUG, generated, "Generated pagination pages.");
    Ok(())
  }
}
