// kiln/src/stages/defaults.rs

//! Fills metadata keys that are absent or null.

use crate::core::context::BuildContext;
use crate::core::file::FileRecord;
use crate::core::matcher::Matcher;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

type ComputeFn = Arc<dyn Fn(&str, &FileRecord) -> Option<Value> + Send + Sync>;

#[derive(Clone)]
enum Fallback {
  Static(Value),
  Computed(ComputeFn),
}

/// Fills metadata keys that are absent or null on matching records.
///
/// Defaults apply in registration order, so a computed default can read a
/// value an earlier default just filled in. Keys that already hold a value
/// are never touched.
#[derive(Clone)]
pub struct DefaultValues {
  matcher: Matcher,
  defaults: Vec<(String, Fallback)>,
}

impl DefaultValues {
  pub fn new(pattern: &str) -> KilnResult<Self> {
    Ok(Self {
      matcher: Matcher::new(pattern)?,
      defaults: Vec::new(),
    })
  }

  pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.defaults.push((key.into(), Fallback::Static(value.into())));
    self
  }

  /// Derives the default from the record. Returning `None` leaves the key unset.
  pub fn compute<F>(mut self, key: impl Into<String>, f: F) -> Self
  where
    F: Fn(&str, &FileRecord) -> Option<Value> + Send + Sync + 'static,
  {
    self.defaults.push((key.into(), Fallback::Computed(Arc::new(f))));
    self
  }
}

impl std::fmt::Debug for DefaultValues {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let keys: Vec<&str> = self.defaults.iter().map(|(k, _)| k.as_str()).collect();
    f.debug_struct("DefaultValues")
      .field("matcher", &self.matcher)
      .field("keys", &keys)
      .finish()
  }
}

#[async_trait]
impl Stage for DefaultValues {
  fn name(&self) -> &str {
    "default-values"
  }

  async fn run(&self, files: &mut FileStore, _ctx: &mut BuildContext) -> KilnResult<()> {
    for path in files.matching(&self.matcher) {
      let Some(record) = files.get_mut(&path) else {
        continue;
      };
      for (key, fallback) in &self.defaults {
        if record.get_set(key).is_some() {
          continue;
        }
        let value = match fallback {
          Fallback::Static(value) => Some(value.clone()),
          Fallback::Computed(f) => f(&path, record),
        };
        if let Some(value) = value {
          record.insert(key.clone(), value);
        }
      }
    }
    Ok(())
  }
}
