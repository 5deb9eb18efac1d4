// kiln/src/conditional/wrapper.rs

//! Defines `Conditional`, a stage decorator that is either fully delegated
//! to or a no-op, decided once when the pipeline is assembled.

use crate::core::context::BuildContext;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use tracing::{event, Level};

/// Runs the wrapped stage only if `enabled` was true at construction.
///
/// When disabled the stage succeeds immediately and leaves the store and
/// context untouched, even if the wrapped stage would have failed. When
/// enabled it is a transparent pass-through, failures included.
pub struct Conditional<S> {
  enabled: bool,
  name: String,
  inner: S,
}

impl<S: Stage> Conditional<S> {
  pub fn new(enabled: bool, inner: S) -> Self {
    Self {
      enabled,
      name: format!("if({})", inner.name()),
      inner,
    }
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  pub fn into_inner(self) -> S {
    self.inner
  }
}

/// Shorthand for [`Conditional::new`].
pub fn when<S: Stage>(enabled: bool, stage: S) -> Conditional<S> {
  Conditional::new(enabled, stage)
}

#[async_trait]
impl<S: Stage> Stage for Conditional<S> {
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    if !self.enabled {
      event!(Level::DEBUG, stage = %self.inner.name(), "Conditional stage disabled; passing through.");
      return Ok(());
    }
    self.inner.run(files, ctx).await
  }
}
