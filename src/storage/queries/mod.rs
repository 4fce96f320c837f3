//! Database query modules.
//!
//! Each module provides synchronous functions that operate on a
//! `rusqlite::Connection`; callers run them through `Database::with_conn`.

pub mod embeddings;
