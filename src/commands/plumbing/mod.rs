//! Plumbing commands
//!
//! - `hash-object`: compute an object id and optionally store the blob
//! - `cat-file`: print an object's content, type or size
//! - `show-ref`: list references and their targets

pub mod cat_file;
pub mod hash_object;
pub mod show_ref;
