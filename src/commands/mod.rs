//! Command implementations behind the `grove` binary
//!
//! - `plumbing`: low-level object and reference access (hash-object, cat-file, show-ref)
//! - `porcelain`: user-facing workflows (init, add, rm, commit, log, branch, tag, config)
//!
//! Commands write their output to the given writer and report failures with
//! `anyhow`, adding context to the library's errors.

pub mod plumbing;
pub mod porcelain;
