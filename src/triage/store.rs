//! Embedding store port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AccountId, EmailEmbedding, EmailId, ModelId, NewEmbedding};
use crate::embedding::{CodecError, EmbeddingError};
use crate::storage::DatabaseError;

/// Errors that can occur while reading or writing embeddings.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Stored row has an invalid model: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Which emails a query may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// Every stored embedding.
    #[default]
    All,
    /// Only embeddings of emails owned by this account.
    Account(AccountId),
}

impl SearchScope {
    pub(crate) fn account(&self) -> Option<&AccountId> {
        match self {
            Self::All => None,
            Self::Account(id) => Some(id),
        }
    }
}

/// Persistence for per-email embeddings, partitioned by model.
///
/// Implementations enforce at most one row per (email, model) through upsert
/// semantics, never through caller-side locking.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Finds the embedding of an email.
    ///
    /// With a model, only that model's row matches. Without one, the most
    /// recently created row for the email wins.
    async fn find_by_email(
        &self,
        email_id: EmailId,
        model: Option<&ModelId>,
    ) -> Result<Option<EmailEmbedding>>;

    /// Lists embeddings matching the model filter and scope.
    ///
    /// Rows come back newest first, but callers must sort explicitly.
    async fn find_all(
        &self,
        model: Option<&ModelId>,
        scope: &SearchScope,
    ) -> Result<Vec<EmailEmbedding>>;

    /// Inserts or overwrites the embedding for (email, model).
    ///
    /// On conflict the vector, folder and correction flag are replaced and
    /// `created_at` is kept.
    async fn save(&self, embedding: NewEmbedding) -> Result<EmailEmbedding>;

    /// Removes every model's embedding for an email. Deleting nothing is not
    /// an error.
    async fn delete(&self, email_id: EmailId) -> Result<()>;

    /// Counts stored embeddings, optionally for one model.
    async fn count(&self, model: Option<&ModelId>) -> Result<usize>;
}
