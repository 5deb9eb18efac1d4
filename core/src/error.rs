// kiln/src/error.rs
use anyhow::Error as AnyhowError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KilnError {
  #[error("Invalid glob pattern '{pattern}': {source}")]
  InvalidPattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("Configuration error: {message}")]
  Configuration { message: String },

  #[error("Failed to read source file '{}': {source}", path.display())]
  SourceRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to walk source tree: {0}")]
  SourceWalk(#[from] walkdir::Error),

  #[error("Malformed front matter in '{}': {source}", path.display())]
  FrontMatter {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("Failed to write destination path '{}': {source}", path.display())]
  DestinationWrite {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Refusing to write file outside the destination: '{path}'")]
  InvalidOutputPath { path: String },

  #[error("Stage '{stage}' (#{index}) failed: {source}")]
  StageFailed {
    stage: String,
    index: usize,
    #[source]
    source: Box<KilnError>,
  },

  #[error("Validation failed for '{path}': {message}")]
  Validation { path: String, message: String },

  #[error("File not found in store: '{path}'")]
  MissingFile { path: String },

  #[error("Cannot move '{from}' to '{to}': destination path already exists")]
  PathCollision { from: String, to: String },

  #[error("Failed to parse data file '{path}': {message}")]
  DataParse { path: String, message: String },

  #[error("Error in stage or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal kiln error: {0}")]
  Internal(String),
}

impl KilnError {
  /// Unwraps `StageFailed` layers (nested pipelines and branches add one
  /// each) and returns the error the failing stage itself reported.
  pub fn root_cause(&self) -> &KilnError {
    match self {
      KilnError::StageFailed { source, .. } => source.root_cause(),
      other => other,
    }
  }

  /// Name of the outermost stage that failed, if this is a stage failure.
  pub fn failed_stage(&self) -> Option<&str> {
    match self {
      KilnError::StageFailed { stage, .. } => Some(stage.as_str()),
      _ => None,
    }
  }
}

// Stages written against anyhow can use `?` directly.
impl From<AnyhowError> for KilnError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<KilnError>() {
      Ok(kiln_err) => kiln_err,
      Err(err) => KilnError::HandlerError { source: err },
    }
  }
}

pub type KilnResult<T, E = KilnError> = std::result::Result<T, E>;
