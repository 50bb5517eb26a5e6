//! Core utilities and shared types
//!
//! - `error`: the typed error taxonomy returned by every store
//! - `fsutil`: atomic writes and advisory lock helpers

pub mod error;
pub mod fsutil;
