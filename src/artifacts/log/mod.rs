//! Commit history traversal
//!
//! - `rev_walk`: ordered, cycle-safe walk of the commit graph used by `log`
//!
//! The walk keeps an explicit frontier and a visited set keyed by object id, so
//! merges and criss-cross histories emit every commit once and deep histories
//! never recurse.

pub mod rev_walk;
