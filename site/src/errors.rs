// kiln/site/src/errors.rs

use kiln::KilnError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Build Error: {source}")]
  Build {
    #[from] // Allows `?` on anything returning KilnResult
    source: KilnError,
  },

  #[error("Build cancelled before completion; destination left untouched.")]
  Cancelled,
}

pub type Result<T, E = SiteError> = std::result::Result<T, E>;
