// kiln/src/kiln.rs

//! The top-level engine: binds the I/O boundary to a [`Pipeline`].

use crate::core::context::BuildContext;
use crate::core::matcher::Matcher;
use crate::core::metadata::Metadata;
use crate::core::stage::Stage;
use crate::core::store::FileStore;
use crate::error::{KilnError, KilnResult};
use crate::io::{read_tree, write_tree};
use crate::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Construction-time settings for a [`Kiln`].
#[derive(Debug, Clone)]
pub struct KilnOptions {
  /// Root of the tree to read.
  pub source: PathBuf,
  /// Directory the processed store is written to.
  pub destination: PathBuf,
  /// Initial global metadata. Every build starts from a fresh copy.
  pub metadata: Metadata,
  /// Remove existing destination contents before writing.
  pub clean: bool,
  /// Glob patterns (relative to the source root) excluded at read time.
  pub ignore: Vec<String>,
  /// Lift YAML front matter into record metadata at read time.
  pub frontmatter: bool,
}

impl Default for KilnOptions {
  fn default() -> Self {
    Self {
      source: PathBuf::from("./src"),
      destination: PathBuf::from("./build"),
      metadata: Metadata::new(),
      clean: true,
      ignore: Vec::new(),
      frontmatter: true,
    }
  }
}

/// Counts reported by a successful [`Kiln::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
  pub read: usize,
  pub written: usize,
}

/// A configured build: source and destination roots, global metadata and
/// the ordered stages between them.
///
/// `build()` is the only operation with side effects on the destination, and
/// it writes nothing unless every stage succeeded.
#[derive(Debug, Clone)]
pub struct Kiln {
  source: PathBuf,
  destination: PathBuf,
  metadata: Metadata,
  clean: bool,
  ignore: Matcher,
  frontmatter: bool,
  pipeline: Pipeline,
}

/// Lexical normalization so `a/./b` and `a/b/` compare equal. Symlinks are
/// not resolved.
fn lexical(path: &Path) -> PathBuf {
  let base = if path.is_absolute() {
    PathBuf::new()
  } else {
    std::env::current_dir().unwrap_or_default()
  };
  let mut out = base;
  for component in path.components() {
    match component {
      std::path::Component::CurDir => {}
      std::path::Component::ParentDir => {
        out.pop();
      }
      other => out.push(other.as_os_str()),
    }
  }
  out
}

impl Kiln {
  /// Validates `options` and creates an engine with no stages.
  ///
  /// Fails with `InvalidPattern` for a bad ignore glob and with
  /// `Configuration` when the destination is the source, lies inside it or
  /// contains it (cleaning would then delete the input).
  pub fn new(options: KilnOptions) -> KilnResult<Self> {
    let ignore = Matcher::any(&options.ignore)?;

    let source = lexical(&options.source);
    let destination = lexical(&options.destination);
    if destination.starts_with(&source) || source.starts_with(&destination) {
      return Err(KilnError::Configuration {
        message: format!(
          "destination '{}' and source '{}' must not overlap",
          options.destination.display(),
          options.source.display()
        ),
      });
    }

    Ok(Self {
      source: options.source,
      destination: options.destination,
      metadata: options.metadata,
      clean: options.clean,
      ignore,
      frontmatter: options.frontmatter,
      pipeline: Pipeline::new(),
    })
  }

  pub fn use_stage<S>(&mut self, stage: S) -> &mut Self
  where
    S: Stage + 'static,
  {
    self.pipeline.use_stage(stage);
    self
  }

  pub fn use_shared(&mut self, stage: Arc<dyn Stage>) -> &mut Self {
    self.pipeline.use_shared(stage);
    self
  }

  /// Registers `stage` only in effect when `enabled` is true.
  pub fn use_if<S>(&mut self, enabled: bool, stage: S) -> &mut Self
  where
    S: Stage + 'static,
  {
    self.pipeline.use_if(enabled, stage);
    self
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  pub fn metadata_mut(&mut self) -> &mut Metadata {
    &mut self.metadata
  }

  pub fn source(&self) -> &Path {
    &self.source
  }

  pub fn destination(&self) -> &Path {
    &self.destination
  }

  pub fn pipeline(&self) -> &Pipeline {
    &self.pipeline
  }

  /// Reads the source tree into a new store.
  pub async fn read(&self) -> KilnResult<FileStore> {
    let root = self.source.clone();
    let ignore = self.ignore.clone();
    let frontmatter = self.frontmatter;
    tokio::task::spawn_blocking(move || read_tree(&root, &ignore, frontmatter))
      .await
      .map_err(|e| KilnError::Internal(format!("source read task failed: {e}")))?
  }

  /// Runs every stage over `files` with a fresh build context.
  ///
  /// Returns the processed store and the context, whose metadata holds
  /// whatever the stages published.
  pub async fn run(&self, mut files: FileStore) -> KilnResult<(FileStore, BuildContext)> {
    let mut ctx = BuildContext::with_roots(self.metadata.clone(), self.source.clone(), self.destination.clone());
    self.pipeline.run(&mut files, &mut ctx).await?;
    Ok((files, ctx))
  }

  /// Reads and runs, without writing anything.
  pub async fn process(&self) -> KilnResult<(FileStore, BuildContext)> {
    let files = self.read().await?;
    self.run(files).await
  }

  /// Writes `files` to the destination, cleaning it first if configured.
  pub async fn write(&self, files: FileStore) -> KilnResult<usize> {
    let root = self.destination.clone();
    let clean = self.clean;
    tokio::task::spawn_blocking(move || write_tree(&root, &files, clean))
      .await
      .map_err(|e| KilnError::Internal(format!("destination write task failed: {e}")))?
  }

  /// Read, run every stage, then write.
  ///
  /// Nothing is written if reading or any stage fails. Dropping the returned
  /// future before it completes cancels the build; the destination is only
  /// touched in the final write step.
  #[instrument(
    name = "Kiln::build",
    skip_all,
    fields(source = %self.source.display(), destination = %self.destination.display(), num_steps = self.pipeline.len()),
    err(Display)
  )]
  pub async fn build(&self) -> KilnResult<BuildReport> {
    let files = self.read().await?;
    let read = files.len();
    event!(Level::INFO, num_files = read, "Source read.");

    let (files, _ctx) = self.run(files).await?;
    let written = self.write(files).await?;
    event!(Level::INFO, read, written, "Build finished.");
    Ok(BuildReport { read, written })
  }
}
