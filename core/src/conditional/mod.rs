// kiln/src/conditional/mod.rs

//! Stages that decide which files, or whether anything at all, another
//! stage sequence gets to see.
//!
//! - [`Conditional`] gates a stage on a flag resolved when the pipeline is
//!   assembled (typically the production/development profile).
//! - [`Branch`] runs a nested stage sequence against a glob-filtered subset
//!   of the store and merges the result back.

pub mod scope;
pub mod wrapper;

pub use scope::Branch;
pub use wrapper::{when, Conditional};
