//! # cookiestore
//!
//! A persistent HTTP cookie store.
//!
//! Cookies live in an in-memory index bucketed by effective URI
//! (`scheme://host[:port]`). Every mutation re-encodes the affected bucket
//! and commits it to a key-value backend, so a store reopened over the same
//! namespace sees exactly what the previous one held.
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy and load reporting
//! - [`cookies`] - Cookie type, index, persistent store, codec
//! - [`storage`] - Key-value backends (in-memory, SQLite)
//!
//! ## Concurrency
//!
//! Stores are `Send + Sync`. All operations of stores sharing a name are
//! serialized by one process-wide lock per name.

pub mod base;
pub mod cookies;
pub mod storage;
