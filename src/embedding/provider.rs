//! Embedding provider contract and shared provider handle.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::domain::{InvalidModelId, ModelId};
use crate::embedding::{BertProvider, HashingProvider, ModelRegistry, ModelType};

/// Errors that can occur while producing or comparing embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Similarity is not a finite number")]
    NonFinite,

    #[error("Model unavailable: {0}")]
    Model(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error(transparent)]
    InvalidModelId(#[from] InvalidModelId),

    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// For unit-length inputs this is the plain dot product. A zero vector has
/// similarity 0.0 with everything. Vectors holding NaN or values large enough
/// to overflow yield [`EmbeddingError::NonFinite`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot / (norm_a * norm_b);
    if !similarity.is_finite() {
        return Err(EmbeddingError::NonFinite);
    }
    Ok(similarity.clamp(-1.0, 1.0))
}

/// Scales a vector to unit length in place. Zero vectors are left as-is.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Text to vector inference capability.
///
/// Implementations must return vectors of a fixed dimension for their model
/// and should L2-normalize them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Compares two vectors produced by this provider.
    fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        cosine_similarity(a, b)
    }

    /// Identifier used to partition stored embeddings.
    fn model(&self) -> &ModelId;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;
}

type Loader =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EmbeddingProvider>>> + Send + Sync>;

/// Lazily loaded provider shared by every consumer.
///
/// Built once at startup and passed around by `Arc`. The first call that needs
/// inference runs the loader; concurrent callers wait on that same load. A
/// failed load is not remembered, so the next call tries again.
pub struct SharedProvider {
    model_type: ModelType,
    model: ModelId,
    loader: Loader,
    inner: OnceCell<Arc<dyn EmbeddingProvider>>,
}

impl SharedProvider {
    /// Creates a handle that loads its provider with `loader` on first use.
    pub fn new<F, Fut>(model_type: ModelType, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn EmbeddingProvider>>> + Send + 'static,
    {
        Self {
            model_type,
            model: model_type.model_id(),
            loader: Box::new(move || loader().boxed()),
            inner: OnceCell::new(),
        }
    }

    /// Creates a handle for `model_type`.
    ///
    /// Transformer models load from `model_dir` when given, otherwise from
    /// the Hugging Face hub cache.
    pub fn for_model(model_type: ModelType, model_dir: Option<PathBuf>) -> Self {
        Self::new(model_type, move || {
            let model_dir = model_dir.clone();
            async move {
                let provider: Arc<dyn EmbeddingProvider> = match model_type {
                    ModelType::Hashing384 => Arc::new(HashingProvider::new()),
                    _ => Arc::new(BertProvider::load(model_type, model_dir).await?),
                };
                Ok(provider)
            }
        })
    }

    /// Returns the loaded provider, loading it if needed.
    pub async fn get(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let provider = self
            .inner
            .get_or_try_init(|| async {
                tracing::info!(model = %self.model, "Loading embedding provider");
                let provider = match (self.loader)().await {
                    Ok(provider) => provider,
                    Err(e) => {
                        tracing::warn!(model = %self.model, error = %e, "Embedding provider failed to load");
                        return Err(e);
                    }
                };

                let loaded = ModelRegistry::new().resolve(provider.model().as_str())?;
                if loaded != self.model_type {
                    return Err(EmbeddingError::Model(format!(
                        "loader returned model {} for {}",
                        provider.model(),
                        self.model
                    )));
                }
                Ok(provider)
            })
            .await?;

        Ok(Arc::clone(provider))
    }

    /// Returns whether the provider has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.inner.initialized()
    }
}

impl std::fmt::Debug for SharedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedProvider")
            .field("model", &self.model)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmbeddingProvider for SharedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.get().await?.embed(text).await
    }

    fn model(&self) -> &ModelId {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.model_type.embedding_dim()
    }
}
