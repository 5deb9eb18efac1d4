// kiln/src/stages/collections.rs

//! Named, ordered groupings of files published into global metadata.
//!
//! A collection is stored as `collections.<name>`: an array of store paths in
//! collection order. Each member record also gets `<name>` appended to its
//! own `collection` array, so templates can walk either direction.

use crate::core::context::BuildContext;
use crate::core::matcher::Matcher;
use crate::core::metadata::{compare_values, push_unique, string_list, Metadata};
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{event, Level};

pub const COLLECTIONS_KEY: &str = "collections";
pub const MEMBERSHIP_KEY: &str = "collection";

/// Ordering applied to collection members.
#[derive(Debug, Clone, Default)]
pub struct SortOrder {
  key: Option<String>,
  reverse: bool,
}

impl SortOrder {
  /// Sorts `paths` in place by the metadata value under the sort key, ties
  /// broken by path. Without a key the order is path order.
  pub fn sort(&self, paths: &mut [String], files: &FileStore) {
    paths.sort_by(|a, b| {
      let by_key = match &self.key {
        Some(key) => compare_values(
          files.get(a).and_then(|r| r.get(key)),
          files.get(b).and_then(|r| r.get(key)),
        ),
        None => Ordering::Equal,
      };
      let ord = by_key.then_with(|| a.cmp(b));
      if self.reverse {
        ord.reverse()
      } else {
        ord
      }
    });
  }
}

/// Publishes collections and records membership.
///
/// Collections not named in `groups` are left as they are.
pub(crate) fn publish(files: &mut FileStore, ctx: &mut BuildContext, groups: BTreeMap<String, Vec<String>>) {
  let metadata = ctx.metadata_mut();
  if !matches!(metadata.get(COLLECTIONS_KEY), Some(Value::Object(_))) {
    metadata.insert(COLLECTIONS_KEY.to_string(), Value::Object(Metadata::new()));
  }

  for (name, paths) in groups {
    for path in &paths {
      if let Some(record) = files.get_mut(path) {
        push_unique(&mut record.metadata, MEMBERSHIP_KEY, Value::String(name.clone()));
      }
    }
    event!(Level::DEBUG, collection = %name, size = paths.len(), "Published collection.");
    if let Some(Value::Object(collections)) = metadata.get_mut(COLLECTIONS_KEY) {
      collections.insert(name, Value::Array(paths.into_iter().map(Value::String).collect()));
    }
  }
}

/// Reads every published collection back out of global metadata, in name
/// order. Non-string members are skipped.
pub fn published(ctx: &BuildContext) -> BTreeMap<String, Vec<String>> {
  let Some(Value::Object(collections)) = ctx.get(COLLECTIONS_KEY) else {
    return BTreeMap::new();
  };
  collections
    .iter()
    .map(|(name, members)| {
      let paths = match members {
        Value::Array(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
      };
      (name.clone(), paths)
    })
    .collect()
}

#[derive(Debug, Clone)]
enum Grouping {
  Named(String),
  ByDirectory,
}

/// Groups matching files into collections.
///
/// `named` puts every match in one collection; `by_directory` creates one
/// collection per top-level directory (`blog/a.md` joins `blog`). Files at
/// the root are not part of any directory collection.
#[derive(Debug, Clone)]
pub struct Collections {
  matcher: Matcher,
  grouping: Grouping,
  order: SortOrder,
}

impl Collections {
  pub fn named(name: impl Into<String>, pattern: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      grouping: Grouping::Named(name.into()),
      order: SortOrder::default(),
    })
  }

  pub fn by_directory(pattern: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      grouping: Grouping::ByDirectory,
      order: SortOrder::default(),
    })
  }

  pub fn sort_by(mut self, key: impl Into<String>) -> Self {
    self.order.key = Some(key.into());
    self
  }

  pub fn reverse(mut self, reverse: bool) -> Self {
    self.order.reverse = reverse;
    self
  }
}

#[async_trait]
impl Stage for Collections {
  fn name(&self) -> &str {
    "collections"
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in files.matching(&self.matcher) {
      let name = match &self.grouping {
        Grouping::Named(name) => name.clone(),
        Grouping::ByDirectory => match path.split_once('/') {
          Some((dir, _)) => dir.to_string(),
          None => continue,
        },
      };
      groups.entry(name).or_default().push(path);
    }

    if let Grouping::Named(name) = &self.grouping {
      groups.entry(name.clone()).or_default();
    }
    for paths in groups.values_mut() {
      self.order.sort(paths, files);
    }
    publish(files, ctx, groups);
    Ok(())
  }
}

/// Builds one collection per distinct tag.
///
/// Tags are read from `key` on each matching record (an array, or a
/// comma-separated string) and each distinct tag becomes a collection named
/// by `template` with `{tag}` replaced. Collections published by earlier
/// stages survive.
#[derive(Debug, Clone)]
pub struct TagCollections {
  matcher: Matcher,
  key: String,
  template: String,
  order: SortOrder,
}

impl TagCollections {
  pub fn new(pattern: &str, key: impl Into<String>, template: impl Into<String>) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      key: key.into(),
      template: template.into(),
      order: SortOrder::default(),
    })
  }

  pub fn sort_by(mut self, key: impl Into<String>) -> Self {
    self.order.key = Some(key.into());
    self
  }

  pub fn reverse(mut self, reverse: bool) -> Self {
    self.order.reverse = reverse;
    self
  }

  fn collection_name(&self, tag: &str) -> String {
    self.template.replace("{tag}", tag)
  }
}

#[async_trait]
impl Stage for TagCollections {
  fn name(&self) -> &str {
    "tag-collections"
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in files.matching(&self.matcher) {
      let Some(tags) = files.get(&path).and_then(|r| r.get_set(&self.key)).map(string_list) else {
        continue;
      };
      let mut seen = Vec::new();
      for tag in tags {
        if seen.contains(&tag) {
          continue;
        }
        groups.entry(self.collection_name(&tag)).or_default().push(path.clone());
        seen.push(tag);
      }
    }

    for paths in groups.values_mut() {
      self.order.sort(paths, files);
    }
    event!(Level::DEBUG, key = %self.key, num_tags = groups.len(), "Derived tag collections.");
    publish(files, ctx, groups);
    Ok(())
  }
}

/// Stamps shared metadata onto the members of named collections.
///
/// Keys a member already defines are left alone, so front matter can
/// override the collection-wide value. Members that are no longer in the
/// store are skipped.
#[derive(Debug, Clone, Default)]
pub struct CollectionMetadata {
  entries: BTreeMap<String, Metadata>,
}

impl CollectionMetadata {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(mut self, collection: impl Into<String>, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self
      .entries
      .entry(collection.into())
      .or_default()
      .insert(key.into(), value.into());
    self
  }
}

#[async_trait]
impl Stage for CollectionMetadata {
  fn name(&self) -> &str {
    "collection-metadata"
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    let collections = published(ctx);
    for (name, values) in &self.entries {
      let Some(members) = collections.get(name) else {
        event!(Level::DEBUG, collection = %name, "No such collection, nothing to stamp.");
        continue;
      };
      let mut stamped = 0;
      for path in members {
        let Some(record) = files.get_mut(path) else {
          continue;
        };
        for (key, value) in values {
          if !record.metadata.contains_key(key) {
            record.metadata.insert(key.clone(), value.clone());
          }
        }
        stamped += 1;
      }
      event!(Level::DEBUG, collection = %name, stamped, "Stamped collection metadata.");
    }
    Ok(())
  }
}
