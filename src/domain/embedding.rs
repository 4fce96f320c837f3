//! Email embedding domain types.
//!
//! An embedding records which folder an email was filed into, alongside the
//! vector computed from its text by one specific model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmailId, EmbeddingId, ModelId};

/// A stored embedding for one email under one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEmbedding {
    /// Store-assigned row identifier.
    pub id: EmbeddingId,
    /// Email this embedding describes.
    pub email_id: EmailId,
    /// Unit-length embedding vector.
    pub vector: Vec<f32>,
    /// Model that produced the vector.
    pub model: ModelId,
    /// Folder the email was filed into when last indexed.
    pub folder: String,
    /// Whether the folder came from an explicit user correction.
    pub is_correction: bool,
    /// When the row was first inserted. Upserts leave this untouched.
    pub created_at: DateTime<Utc>,
}

/// Values for inserting or overwriting an embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmbedding {
    pub email_id: EmailId,
    pub vector: Vec<f32>,
    pub model: ModelId,
    pub folder: String,
    pub is_correction: bool,
}

impl NewEmbedding {
    /// Builds an automatically classified embedding.
    pub fn new(
        email_id: EmailId,
        vector: Vec<f32>,
        model: ModelId,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            email_id,
            vector,
            model,
            folder: folder.into(),
            is_correction: false,
        }
    }

    /// Marks the embedding as the result of a user correction.
    pub fn as_correction(mut self, is_correction: bool) -> Self {
        self.is_correction = is_correction;
        self
    }
}
