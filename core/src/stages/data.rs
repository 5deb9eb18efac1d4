// kiln/src/stages/data.rs

//! Stages that turn YAML/JSON data files in the store into metadata.

use crate::core::context::BuildContext;
use crate::core::file::FileRecord;
use crate::core::matcher::Matcher;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{event, Level};

/// Parses a data file by extension: `.json`, `.yml` or `.yaml`.
pub fn parse_data_file(path: &str, record: &FileRecord) -> KilnResult<Value> {
  let parse_err = |message: String| KilnError::DataParse {
    path: path.to_string(),
    message,
  };
  let text = record.text().ok_or_else(|| parse_err("file is not valid UTF-8".to_string()))?;
  let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
  match extension.as_deref() {
    Some("json") => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
    Some("yml" | "yaml") => {
      let value: Option<Value> = serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
      Ok(value.unwrap_or(Value::Null))
    }
    _ => Err(parse_err("unsupported data file extension".to_string())),
  }
}

/// File name without directories or the last extension.
fn file_stem(path: &str) -> &str {
  let name = path.rsplit('/').next().unwrap_or(path);
  match name.rsplit_once('.') {
    Some((stem, _)) if !stem.is_empty() => stem,
    _ => name,
  }
}

/// Resolves `target` as referenced from the record at `from`.
///
/// A leading `/` means "relative to the source root"; anything else is
/// relative to the referencing file's directory. `..` segments pop a
/// directory and cannot climb above the root.
pub fn resolve_reference(from: &str, target: &str) -> Option<String> {
  let mut segments: Vec<&str> = match target.strip_prefix('/') {
    Some(_) => Vec::new(),
    None => {
      let mut dir: Vec<&str> = from.split('/').collect();
      dir.pop();
      dir
    }
  };
  for segment in target.split(['/', '\\']) {
    match segment {
      "" | "." => {}
      ".." => {
        segments.pop()?;
      }
      other => segments.push(other),
    }
  }
  (!segments.is_empty()).then(|| segments.join("/"))
}

/// Loads matching data files into global metadata under their file stem and
/// removes them from the store.
///
/// `data/nav.yml` becomes the global `nav`.
#[derive(Debug, Clone)]
pub struct MetadataDirectory {
  matcher: Matcher,
}

impl MetadataDirectory {
  pub fn new(pattern: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
    })
  }

  pub fn any<I, S>(patterns: I) -> KilnResult<Self>
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
impl Stage for MetadataDirectory {
  fn name(&self) -> &str {
    "metadata-directory"
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    for path in files.matching(&self.matcher) {
      let Some(record) = files.remove(&path) else {
        continue;
      };
      let value = parse_data_file(&path, &record)?;
      event!(Level::DEBUG, %path, key = file_stem(&path), "Loaded global metadata file.");
      ctx.set(file_stem(&path), value);
    }
    Ok(())
  }
}

/// Expands per-file `data` references.
///
/// A record with `data: { name: "path/to/file.yml" }` gets the parsed file
/// under `name` in its own metadata. A reference to a file missing from the
/// store fails with `MissingFile`.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
  remove_source: bool,
}

pub const DATA_KEY: &str = "data";

impl DataLoader {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drop referenced data files from the store once every record is loaded.
  pub fn remove_source(mut self, remove: bool) -> Self {
    self.remove_source = remove;
    self
  }
}

#[async_trait]
impl Stage for DataLoader {
  fn name(&self) -> &str {
    "data-loader"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    let mut loads: Vec<(String, String, String)> = Vec::new();
    for (path, record) in files.iter() {
      let Some(Value::Object(refs)) = record.get(DATA_KEY) else {
        continue;
      };
      for (name, target) in refs {
        let Some(target) = target.as_str() else {
          continue;
        };
        let resolved = resolve_reference(path, target).ok_or_else(|| KilnError::MissingFile {
          path: target.to_string(),
        })?;
        loads.push((path.clone(), name.clone(), resolved));
      }
    }

    let mut sources = BTreeSet::new();
    for (path, name, source) in loads {
      let record = files
        .get(&source)
        .ok_or_else(|| KilnError::MissingFile { path: source.clone() })?;
      let value = parse_data_file(&source, record)?;
      if let Some(target) = files.get_mut(&path) {
        target.insert(name, value);
      }
      sources.insert(source);
    }

    if self.remove_source {
      for source in &sources {
        files.remove(source);
      }
    }
    event!(Level::DEBUG, num_sources = sources.len(), "Loaded per-file data.");
    Ok(())
  }
}
