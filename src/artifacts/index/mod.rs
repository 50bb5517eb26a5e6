//! Index file format
//!
//! The index (staging area) records which paths, with which content, go into
//! the next commit.
//!
//! ## File Format
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "GIDX" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, sorted by path)
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod pathspec;

/// Size of the trailing checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Magic signature identifying index files
pub const SIGNATURE: &[u8; 4] = b"GIDX";

/// Index file format version
pub const VERSION: u32 = 1;
