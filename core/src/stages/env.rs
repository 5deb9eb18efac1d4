// kiln/src/stages/env.rs

//! Publishes a snapshot of environment variables as global `env`.

use crate::core::context::BuildContext;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const ENV_KEY: &str = "env";

/// Publishes environment variables as the global `env` object.
///
/// Variables are captured when the stage is built, not when it runs, so
/// every build of one engine sees the same values.
#[derive(Debug, Clone, Default)]
pub struct Env {
  vars: BTreeMap<String, String>,
}

impl Env {
  /// Snapshots the current process environment. Variables that are not
  /// valid Unicode are skipped.
  pub fn from_process() -> Self {
    Self::from_vars(std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))))
  }

  pub fn from_vars<I, K, V>(vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }
}

#[async_trait]
impl Stage for Env {
  fn name(&self) -> &str {
    "env"
  }

  async fn run(&self, _files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    let env: Map<String, Value> = self
      .vars
      .iter()
      .map(|(k, v)| (k.clone(), Value::String(v.clone())))
      .collect();
    ctx.set(ENV_KEY, Value::Object(env));
    Ok(())
  }
}
