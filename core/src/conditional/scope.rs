// kiln/src/conditional/scope.rs

//! Defines `Branch`, a stage that runs a nested pipeline against only the
//! files matching a glob pattern and merges the result back.

use crate::core::context::BuildContext;
use crate::core::matcher::Matcher;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use tracing::{event, instrument, Level};

/// A scoped sub-pipeline.
///
/// At run time the branch snapshots the keys matching its pattern, clones
/// those records into a private store and runs its nested stages against
/// that store with the shared build context. On success the private store is
/// merged back:
///
/// - matched files the nested stages deleted are deleted from the parent,
/// - every file left in the private store (mutated, renamed or new) is
///   written into the parent.
///
/// Files outside the pattern are never visible to the nested stages and are
/// returned untouched, with one exception: if the nested stages produce a
/// path that already exists outside the scope, the branch's record replaces
/// it (the last stage to touch a path wins) and a warning is logged.
///
/// If a nested stage fails, the parent store is left exactly as it was.
#[derive(Debug, Clone)]
pub struct Branch {
  name: String,
  matcher: Matcher,
  pipeline: Pipeline,
}

impl Branch {
  pub fn new(pattern: &str) -> KilnResult<Self> {
    Ok(Self::with_matcher(Matcher::new(pattern)?))
  }

  /// A branch over the union of several patterns.
  pub fn any<I, S>(patterns: I) -> KilnResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Ok(Self::with_matcher(Matcher::any(patterns)?))
  }

  pub fn with_matcher(matcher: Matcher) -> Self {
    Self {
      name: format!("branch({})", matcher),
      matcher,
      pipeline: Pipeline::new(),
    }
  }

  /// Appends a nested stage.
  pub fn use_stage<S>(mut self, stage: S) -> Self
  where
    S: Stage + 'static,
  {
    self.pipeline.use_stage(stage);
    self
  }

  /// Appends a nested stage that only runs if `enabled`.
  pub fn use_if<S>(mut self, enabled: bool, stage: S) -> Self
  where
    S: Stage + 'static,
  {
    self.pipeline.use_if(enabled, stage);
    self
  }

  pub fn matcher(&self) -> &Matcher {
    &self.matcher
  }

  pub fn pipeline(&self) -> &Pipeline {
    &self.pipeline
  }
}

#[async_trait]
impl Stage for Branch {
  fn name(&self) -> &str {
    &self.name
  }

  #[instrument(
        name = "Branch::run",
        skip_all,
        fields(pattern = %self.matcher, nested_steps = self.pipeline.len()),
        err(Display)
    )]
  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    let scope = files.matching(&self.matcher);
    event!(Level::DEBUG, matched = scope.len(), "Running branch over matched files.");

    let mut scoped = files.subset(&scope);
    self.pipeline.run(&mut scoped, ctx).await?;

    let overwritten = files.merge_scoped(&scope, scoped);
    for path in &overwritten {
      event!(Level::WARN, %path, "Branch output replaced a file outside its pattern.");
    }
    event!(Level::DEBUG, num_files = files.len(), "Branch merged back.");
    Ok(())
  }
}
