// kiln/src/core/mod.rs

//! Building blocks shared by the engine and every stage: the virtual file
//! store, its records and metadata, path matching, the build context and the
//! `Stage` contract.

pub mod context;
pub mod file;
pub mod matcher;
pub mod metadata;
pub mod stage;
pub mod step;
pub mod store;

pub use context::BuildContext;
pub use file::FileRecord;
pub use matcher::Matcher;
pub use metadata::Metadata;
pub use stage::{from_async_fn, from_fn, Stage, StageFuture};
pub use step::StepDef;
pub use store::FileStore;
