//! Core repository components
//!
//! - `config`: layered TOML configuration
//! - `database`: object database for blobs, trees, commits and tags
//! - `index`: staging area for the next commit
//! - `refs`: reference management (branches, HEAD, tags)
//! - `repository`: the handle tying the components together
//! - `workspace`: working tree file system access

pub mod config;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
