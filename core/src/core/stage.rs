// kiln/src/core/stage.rs

//! Defines the `Stage` trait, the one contract every transformation satisfies,
//! and adapters turning closures into stages.

use crate::core::context::BuildContext;
use crate::core::store::FileStore;
use crate::error::KilnResult;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by closures passed to [`from_async_fn`].
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = KilnResult<()>> + Send + 'a>>;

/// One pluggable transformation step.
///
/// `run` receives the live file store and build context and resolves exactly
/// once: `Ok(())` when the stage is done (all of its mutations are then
/// visible to the next stage), or `Err` to abort the build. A stage that
/// produces a whole new store version does so by assigning `*files`.
///
/// Stages may await freely, including fanning out over files internally,
/// but the engine never starts the next stage before this future resolves.
#[async_trait]
pub trait Stage: Send + Sync {
  /// Name used in logs and in `KilnError::StageFailed`.
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()>;
}

#[async_trait]
impl<S: Stage + ?Sized> Stage for Box<S> {
  fn name(&self) -> &str {
    (**self).name()
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    (**self).run(files, ctx).await
  }
}

#[async_trait]
impl<S: Stage + ?Sized> Stage for Arc<S> {
  fn name(&self) -> &str {
    (**self).name()
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    (**self).run(files, ctx).await
  }
}

// --- Closure adapters ---

/// A stage backed by a synchronous closure. See [`from_fn`].
pub struct FnStage<F> {
  name: String,
  f: F,
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
  F: Fn(&mut FileStore, &mut BuildContext) -> KilnResult<()> + Send + Sync,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    (self.f)(files, ctx)
  }
}

/// Wraps a synchronous closure as a named stage.
///
/// ```
/// use kiln::{from_fn, FileRecord};
///
/// let stage = from_fn("add-robots", |files, _ctx| {
///   files.insert("robots.txt", FileRecord::new("User-agent: *\n"));
///   Ok(())
/// });
/// # let _ = stage;
/// ```
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnStage<F>
where
  F: Fn(&mut FileStore, &mut BuildContext) -> KilnResult<()> + Send + Sync + 'static,
{
  FnStage { name: name.into(), f }
}

/// A stage backed by a closure returning a boxed future. See [`from_async_fn`].
pub struct AsyncFnStage<F> {
  name: String,
  f: F,
}

#[async_trait]
impl<F> Stage for AsyncFnStage<F>
where
  F: for<'a> Fn(&'a mut FileStore, &'a mut BuildContext) -> StageFuture<'a> + Send + Sync,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, files: &mut FileStore, ctx: &mut BuildContext) -> KilnResult<()> {
    (self.f)(files, ctx).await
  }
}

/// Wraps an asynchronous closure as a named stage. The closure must box its
/// future, e.g. `|files, ctx| Box::pin(async move { ... })`.
pub fn from_async_fn<F>(name: impl Into<String>, f: F) -> AsyncFnStage<F>
where
  F: for<'a> Fn(&'a mut FileStore, &'a mut BuildContext) -> StageFuture<'a> + Send + Sync + 'static,
{
  AsyncFnStage { name: name.into(), f }
}
