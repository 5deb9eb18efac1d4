// kiln/src/io/mod.rs

//! The source/destination boundary around a pipeline run.

pub mod destination;
pub mod frontmatter;
pub mod source;

pub use destination::write_tree;
pub use source::read_tree;
