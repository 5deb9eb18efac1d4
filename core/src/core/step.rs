// kiln/src/core/step.rs

//! Defines the structure for a single registered step within a pipeline.

use crate::core::stage::Stage;
use std::sync::Arc;

/// A stage as registered in a pipeline: the stage itself plus the name it
/// had at registration time.
///
/// Stages are held behind `Arc` so a pipeline (and therefore a `Branch`
/// containing one) can be cloned cheaply.
#[derive(Clone)]
pub struct StepDef {
  pub name: String,
  pub stage: Arc<dyn Stage>,
}

impl StepDef {
  pub fn new(stage: Arc<dyn Stage>) -> Self {
    Self {
      name: stage.name().to_string(),
      stage,
    }
  }
}

// `dyn Stage` has no Debug; show the name only.
impl std::fmt::Debug for StepDef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef").field("name", &self.name).finish()
  }
}
