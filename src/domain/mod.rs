//! Domain layer types for semantic triage.
//!
//! Identifiers and the persisted embedding entity shared by the storage,
//! embedding and triage layers.

mod embedding;
mod types;

pub use embedding::{EmailEmbedding, NewEmbedding};
pub use types::{AccountId, EmailId, EmbeddingId, InvalidModelId, ModelId};
