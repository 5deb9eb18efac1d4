// kiln/src/pipeline/mod.rs

//! Defines the `Pipeline` struct, its construction and its execution logic.

pub mod definition;
pub mod execution;

pub use definition::Pipeline;
