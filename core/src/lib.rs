// src/lib.rs

//! Kiln: an async, ordered file-transformation pipeline for static site builds.
//!
//! A build reads a source directory into a virtual [`FileStore`], threads it
//! through an ordered list of [`Stage`]s together with a shared
//! [`BuildContext`], and writes whatever is left to a destination directory.
//! Kiln gives you:
//!  - Strictly sequential stages; the first failure aborts the build before
//!    anything is written.
//!  - Global metadata shared by every stage ("last stage to run wins").
//!  - [`Branch`]: a nested stage sequence that only sees files matching a glob
//!    and merges its result (including deletions) back.
//!  - [`Conditional`]: stages switched on or off when the pipeline is assembled.
//!  - YAML front matter, ignore patterns and destination cleaning at the I/O
//!    boundary.
//!  - A set of generic built-in stages in [`stages`], and a bounded fan-out
//!    helper in [`concurrent`] for slow per-file work.

pub mod concurrent;
pub mod conditional;
pub mod core;
pub mod error;
pub mod io;
pub mod kiln;
pub mod pipeline;
pub mod stages;

// --- Re-exports for the Public API ---

pub use crate::core::context::BuildContext;
pub use crate::core::file::FileRecord;
pub use crate::core::matcher::Matcher;
pub use crate::core::metadata::Metadata;
pub use crate::core::stage::{from_async_fn, from_fn, Stage, StageFuture};
pub use crate::core::store::FileStore;

pub use crate::pipeline::definition::Pipeline;

pub use crate::conditional::{when, Branch, Conditional};

pub use crate::kiln::{BuildReport, Kiln, KilnOptions};

pub use crate::error::{KilnError, KilnResult};
