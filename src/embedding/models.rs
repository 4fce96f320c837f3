//! Embedding model definitions and registry.
//!
//! Every model that may write embeddings is listed here. Stored rows are
//! partitioned by [`ModelId`], so a loaded provider's model id must resolve
//! to exactly one [`ModelType`] before it is used to read or write the store.

use serde::{Deserialize, Serialize};

use crate::domain::ModelId;
use crate::embedding::{EmbeddingError, Result};

/// Available embedding model types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Feature-hashing bag of words. Needs no weights.
    #[default]
    Hashing384,
    /// MiniLM model - fast, small, good for general text.
    MiniLm,
    /// All-MiniLM-L6-v2 - balanced speed and quality.
    AllMiniLmL6V2,
    /// BGE-Small - optimized for retrieval tasks.
    BgeSmall,
    /// E5-Small - good for asymmetric search.
    E5Small,
}

impl ModelType {
    /// All registered model types.
    pub const ALL: [ModelType; 5] = [
        Self::Hashing384,
        Self::MiniLm,
        Self::AllMiniLmL6V2,
        Self::BgeSmall,
        Self::E5Small,
    ];

    /// Returns the storage partition key for this model.
    pub fn model_id(&self) -> ModelId {
        ModelId::from_static(self.id_str())
    }

    fn id_str(&self) -> &'static str {
        match self {
            Self::Hashing384 => "local/hashing-384",
            Self::MiniLm => "sentence-transformers/paraphrase-MiniLM-L6-v2",
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::BgeSmall => "BAAI/bge-small-en-v1.5",
            Self::E5Small => "intfloat/e5-small-v2",
        }
    }

    /// Returns the Hugging Face model ID, or `None` for local-only models.
    pub fn hf_model_id(&self) -> Option<&'static str> {
        match self {
            Self::Hashing384 => None,
            _ => Some(self.id_str()),
        }
    }

    /// Returns the expected embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        384
    }

    /// Returns the maximum sequence length in tokens.
    pub fn max_seq_length(&self) -> usize {
        match self {
            Self::Hashing384 | Self::MiniLm | Self::AllMiniLmL6V2 => 256,
            Self::BgeSmall | Self::E5Small => 512,
        }
    }

    /// Returns the prefix applied to indexed documents, if the model needs one.
    pub fn document_prefix(&self) -> Option<&'static str> {
        match self {
            Self::E5Small => Some("passage: "),
            _ => None,
        }
    }
}

/// Information about a model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model type.
    pub model_type: ModelType,
    /// Human-readable name.
    pub name: &'static str,
    /// Description of the model.
    pub description: &'static str,
    /// Approximate download size in bytes (zero for local models).
    pub size_bytes: u64,
}

impl ModelInfo {
    /// Creates info for a model type.
    pub fn for_model(model_type: ModelType) -> Self {
        let (name, description, size_bytes) = match model_type {
            ModelType::Hashing384 => (
                "Hashing-384",
                "Offline bag-of-words hashing, no download required",
                0,
            ),
            ModelType::MiniLm => (
                "MiniLM",
                "Fast, small model for general text embedding",
                90_000_000,
            ),
            ModelType::AllMiniLmL6V2 => (
                "All-MiniLM-L6-v2",
                "Balanced model with good quality and speed",
                90_000_000,
            ),
            ModelType::BgeSmall => (
                "BGE-Small",
                "Optimized for retrieval and semantic search",
                130_000_000,
            ),
            ModelType::E5Small => (
                "E5-Small",
                "Good for asymmetric search (query vs document)",
                130_000_000,
            ),
        };

        Self {
            model_type,
            name,
            description,
            size_bytes,
        }
    }
}

/// Registry of known embedding models.
#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Creates a new registry with all available models.
    pub fn new() -> Self {
        Self {
            models: ModelType::ALL.into_iter().map(ModelInfo::for_model).collect(),
        }
    }

    /// Maps a stored model identifier back to its model type.
    pub fn resolve(&self, id: &str) -> Result<ModelType> {
        let id = ModelId::new(id)?;
        self.models
            .iter()
            .map(|m| m.model_type)
            .find(|t| t.model_id() == id)
            .ok_or_else(|| EmbeddingError::UnknownModel(id.to_string()))
    }
}
