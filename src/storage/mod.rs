//! SQLite storage for embeddings.
//!
//! This module provides the storage layer for semantic triage:
//!
//! - SQLite database holding the `email_embeddings` table
//! - Row-level queries used by the SQLite embedding store
//! - Async-safe database operations via tokio::task::spawn_blocking

mod database;
pub mod queries;
mod schema;

pub use database::{Database, DatabaseError, Result};
