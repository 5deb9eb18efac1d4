// kiln/src/stages/mod.rs

//! Built-in, renderer-agnostic stages.
//!
//! Every stage takes its configuration at construction; glob patterns are
//! compiled there, so a bad pattern surfaces as `InvalidPattern` while the
//! pipeline is being assembled rather than mid-build.

pub mod collections;
pub mod concat;
pub mod data;
pub mod defaults;
pub mod env;
pub mod filter;
pub mod guard;
pub mod paginate;
pub mod paths;
pub mod text;
pub mod validate;

pub use collections::{CollectionMetadata, Collections, TagCollections};
pub use concat::Concat;
pub use data::{DataLoader, MetadataDirectory};
pub use defaults::DefaultValues;
pub use env::Env;
pub use filter::{Drafts, Except, Ignore};
pub use guard::TemplateGuard;
pub use paginate::Paginate;
pub use paths::{Copy, Rename};
pub use text::{Excerpts, ReadingTime};
pub use validate::Validate;
