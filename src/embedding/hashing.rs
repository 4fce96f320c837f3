//! Feature-hashing embedding provider.
//!
//! Produces bag-of-words vectors without any model weights: each lowercased
//! alphanumeric token is hashed into one of 384 buckets with a hashed sign,
//! then the vector is L2-normalized. Texts sharing words land close together,
//! which is enough for offline triage before a transformer model is available.

use async_trait::async_trait;

use crate::domain::ModelId;
use crate::embedding::{l2_normalize, EmbeddingProvider, ModelType, Result};

/// Deterministic, dependency-free embedding provider.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    model: ModelId,
    dimension: usize,
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HashingProvider {
    pub fn new() -> Self {
        let model_type = ModelType::Hashing384;
        Self {
            model: model_type.model_id(),
            dimension: model_type.embedding_dim(),
        }
    }

    /// Computes the embedding synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn model(&self) -> &ModelId {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// 64-bit FNV-1a, stable across processes and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
