// kiln/src/concurrent.rs

//! Bounded fan-out over files inside a single stage.
//!
//! Stages that do slow per-file work (fetching, resizing, shelling out) can
//! use [`try_for_each_file`] to process several records at once while still
//! handing a single result back to the engine. The store itself is never
//! shared across tasks: each task gets a clone of its record, and the caller
//! applies the collected results afterwards.

use crate::core::file::FileRecord;
use crate::core::store::FileStore;
use crate::error::{KilnError, KilnResult};
use futures_util::stream::{self, TryStreamExt};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{event, Level};

/// Runs `f(path, record)` for each of `paths` with at most `limit` calls in
/// flight, and returns every result keyed by path.
///
/// The first error stops scheduling new work and is returned; results of
/// calls that already finished are discarded. A missing path is reported as
/// `MissingFile` before anything runs. `limit` of zero is treated as one.
pub async fn try_for_each_file<T, F, Fut>(
  files: &FileStore,
  paths: &[String],
  limit: usize,
  f: F,
) -> KilnResult<BTreeMap<String, T>>
where
  F: Fn(String, FileRecord) -> Fut,
  Fut: Future<Output = KilnResult<T>>,
{
  let inputs = paths
    .iter()
    .map(|path| {
      files
        .get(path)
        .cloned()
        .map(|record| (path.clone(), record))
        .ok_or_else(|| KilnError::MissingFile { path: path.clone() })
    })
    .collect::<KilnResult<Vec<_>>>()?;

  let limit = limit.max(1);
  event!(Level::DEBUG, num_files = inputs.len(), limit, "Starting bounded fan-out.");

  let results = Mutex::new(BTreeMap::new());
  stream::iter(inputs.into_iter().map(Ok::<_, KilnError>))
    .try_for_each_concurrent(limit, |(path, record)| {
      let fut = f(path.clone(), record);
      let results = &results;
      async move {
        let value = fut.await?;
        results.lock().insert(path, value);
        Ok(())
      }
    })
    .await?;

  Ok(results.into_inner())
}
