// kiln/site/src/main.rs

mod config;
mod errors;
mod pipeline;
mod stages;

use crate::config::SiteConfig;
use crate::errors::{Result as SiteResult, SiteError};

use kiln::BuildReport;
use std::process::ExitCode;
use tracing_subscriber::fmt::format::FmtSpan; // For span close timings
use tracing_subscriber::EnvFilter;

async fn run() -> SiteResult<BuildReport> {
  let config = SiteConfig::from_env()?;
  let kiln = pipeline::assemble(&config)?;

  // Dropping the build future on Ctrl-C cancels it. Output is only written
  // after the last stage, so an interrupted build leaves the destination as is.
  tokio::select! {
    result = kiln.build() => Ok(result?),
    _ = tokio::signal::ctrl_c() => Err(SiteError::Cancelled),
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting site build...");

  match run().await {
    Ok(report) => {
      tracing::info!(read = report.read, written = report.written, "Site built.");
      ExitCode::SUCCESS
    }
    Err(e) => {
      tracing::error!(error = %e, "Site build failed.");
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}
