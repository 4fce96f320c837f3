//! Semantic triage: nearest-neighbor folder suggestions.
//!
//! Previously filed emails are embedded and stored. A new email is compared
//! against them, and its nearest neighbors vote on a destination folder.
//!
//! - [`EmbeddingStore`] - persistence port, with [`InMemoryEmbeddingStore`]
//!   and [`SqliteEmbeddingStore`] implementations
//! - [`SimilarityEngine`] - indexing and top-K search
//! - [`calculate_confidence`] - weighted folder vote

mod confidence;
mod memory_store;
mod similarity;
mod sqlite_store;
mod store;

use thiserror::Error;

use crate::embedding::EmbeddingError;

pub use confidence::{calculate_confidence, FolderSuggestion, CORRECTION_WEIGHT};
pub use memory_store::InMemoryEmbeddingStore;
pub use similarity::{LinearScan, RankingStrategy, SimilarEmail, SimilarityEngine, DEFAULT_TOP_K};
pub use sqlite_store::SqliteEmbeddingStore;
pub use store::{EmbeddingStore, SearchScope, StoreError};

/// Errors surfaced by triage operations.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
