// kiln/src/pipeline/definition.rs

//! Contains the `Pipeline` struct definition and methods for its
//! construction and structural modification.

use crate::conditional::Conditional;
use crate::core::stage::Stage;
use crate::core::step::StepDef;
use std::sync::Arc;

/// An ordered sequence of stages.
///
/// Stages run strictly in registration order, each one to completion before
/// the next starts. A `Pipeline` is itself a [`Stage`], so pipelines nest
/// (this is how a [`Branch`](crate::Branch) carries its sub-sequence).
#[derive(Clone, Default)]
pub struct Pipeline {
  /// Ordered list of step definitions for this pipeline.
  pub(crate) steps: Vec<StepDef>,
}

impl Pipeline {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a stage. Returns `&mut Self` so registrations can be chained
  /// or issued one at a time.
  pub fn use_stage<S>(&mut self, stage: S) -> &mut Self
  where
    S: Stage + 'static,
  {
    self.steps.push(StepDef::new(Arc::new(stage)));
    self
  }

  /// Appends an already shared stage.
  pub fn use_shared(&mut self, stage: Arc<dyn Stage>) -> &mut Self {
    self.steps.push(StepDef::new(stage));
    self
  }

  /// Appends `stage` wrapped in a [`Conditional`]: it runs only if `enabled`.
  pub fn use_if<S>(&mut self, enabled: bool, stage: S) -> &mut Self
  where
    S: Stage + 'static,
  {
    self.use_stage(Conditional::new(enabled, stage))
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  /// Registered step names, in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }
}

impl std::fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline").field("steps", &self.step_names()).finish()
  }
}
