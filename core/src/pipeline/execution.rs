// kiln/src/pipeline/execution.rs

//! Contains `Pipeline::run()`, which executes the pipeline's stages in order.

use crate::core::context::BuildContext;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::{KilnError, KilnResult};
use crate::pipeline::definition::Pipeline;
use async_trait::async_trait;
use tracing::{event, instrument, span, Instrument, Level};

impl Pipeline {
  /// Executes every stage against `files` and `ctx`, strictly in order.
  ///
  /// Each stage is awaited to completion before the next one starts. The
  /// first failing stage aborts the run; later stages never execute and the
  /// error comes back wrapped in `KilnError::StageFailed`. Whatever the
  /// failing stage had already done to `files` is left as is.
  #[instrument(
        name = "Pipeline::run",
        skip_all,
        fields(num_steps = self.steps.len(), num_files = files.len()),
        err(Display)
    )]
  pub async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step_execution",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
      );

      let outcome = async {
        event!(Level::DEBUG, num_files = files.len(), "Running stage.");
        step_def.stage.run(files, ctx).await
      }
      .instrument(step_span)
      .await;

      if let Err(e) = outcome {
        event!(Level::ERROR, step_name = %step_def.name, step_index = step_idx, error = %e, "Stage failed; aborting pipeline.");
        return Err(KilnError::StageFailed {
          stage: step_def.name.clone(),
          index: step_idx,
          source: Box::new(e),
        });
      }
      event!(Level::TRACE, step_name = %step_def.name, num_files = files.len(), "Stage finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed successfully.");
    Ok(())
  }
}

#[async_trait]
impl Stage for Pipeline {
  fn name(&self) -> &str {
    "pipeline"
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    Pipeline::run(self, files, ctx).await
  }
}
