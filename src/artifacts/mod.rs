//! Value types and algorithms
//!
//! - `core`: Error taxonomy and filesystem helpers
//! - `index`: Index file format, entry modes and pathspecs
//! - `log`: Commit history traversal
//! - `objects`: Object types (blob, tree, commit, tag) and ids
//! - `refs`: Reference names, values and branch kinds

pub mod core;
pub mod index;
pub mod log;
pub mod objects;
pub mod refs;
