//! Porcelain commands
//!
//! - `init`: create a repository
//! - `add` / `rm`: stage and unstage files
//! - `commit`: record the index as a commit
//! - `log`: show commit history
//! - `branch`, `tag`: manage references
//! - `config`: read and write configuration

pub mod add;
pub mod branch;
pub mod commit;
pub mod config;
pub mod init;
pub mod log;
pub mod rm;
pub mod tag;
