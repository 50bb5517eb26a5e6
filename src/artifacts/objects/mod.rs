//! Object model
//!
//! All content is stored as immutable objects identified by their digest. There are
//! four types:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, modes, and object IDs)
//! - **Commit**: Snapshot with metadata (author, message, parent commits, tree)
//! - **Tag**: Annotated reference to another object
//!
//! All objects share the canonical encoding `<type> <size>\0<content>`, which is
//! what gets hashed and stored.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod signature;
pub mod tag;
pub mod tree;
