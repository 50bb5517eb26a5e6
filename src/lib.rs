//! grove: a small content-addressed object store with commit-graph traversal
//!
//! - [`areas`]: the stateful stores of a repository (objects, references,
//!   index, configuration) and the [`Repository`] handle coordinating them
//! - [`artifacts`]: value types and algorithms (object encodings, reference
//!   names, index entries, revision walking)
//! - [`commands`]: the operations behind the `grove` binary

pub mod areas;
pub mod artifacts;
pub mod commands;

pub use areas::repository::Repository;
pub use artifacts::core::error::{Error, ErrorKind, Result};
pub use artifacts::log::rev_walk::{RevWalk, SortMode};
pub use artifacts::objects::object_id::{HashAlgorithm, ObjectId};
