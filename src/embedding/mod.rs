//! Vector embeddings for semantic triage.
//!
//! This module turns email text into fixed-dimension vectors and defines
//! how they are stored and compared.
//!
//! # Architecture
//!
//! - [`EmbeddingProvider`] - text to vector inference, plus similarity
//! - [`SharedProvider`] - lazily loaded provider shared by every consumer
//! - [`HashingProvider`] / [`BertProvider`] - local provider implementations
//! - [`codec`] - little-endian `f32` blob format used by the store
//! - [`ModelRegistry`] - known models and their storage identifiers
//!
//! # Example
//!
//! ```no_run
//! use margin_triage::embedding::{EmbeddingProvider, ModelType, SharedProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = SharedProvider::for_model(ModelType::AllMiniLmL6V2, None);
//! let a = provider.embed("Invoice for December").await?;
//! let b = provider.embed("Payment receipt").await?;
//! println!("similarity: {}", provider.similarity(&a, &b)?);
//! # Ok(())
//! # }
//! ```

mod bert;
pub mod codec;
mod hashing;
mod models;
mod provider;
mod text_prep;

pub use bert::BertProvider;
pub use codec::CodecError;
pub use hashing::HashingProvider;
pub use models::{ModelInfo, ModelRegistry, ModelType};
pub use provider::{
    cosine_similarity, l2_normalize, EmbeddingError, EmbeddingProvider, Result, SharedProvider,
};
pub use text_prep::{prepare_text, MAX_TEXT_CHARS};

#[cfg(test)]
pub use provider::MockEmbeddingProvider;
