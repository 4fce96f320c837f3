//! Nearest-neighbor search over stored embeddings.
//!
//! The engine embeds a query, fetches every candidate for the active model,
//! and hands both to a [`RankingStrategy`]. [`LinearScan`] compares the query
//! against every candidate, which keeps cost linear in corpus size; corpora
//! are expected to stay around ten thousand rows per model and scope.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{EmailEmbedding, EmailId, NewEmbedding};
use crate::embedding::{EmbeddingError, EmbeddingProvider, Result as EmbeddingResult};
use crate::triage::store::{EmbeddingStore, SearchScope};
use crate::triage::Result;

/// Number of neighbors returned when the caller does not choose.
pub const DEFAULT_TOP_K: usize = 5;

/// A stored email ranked against a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarEmail {
    pub email_id: EmailId,
    pub folder: String,
    pub similarity: f32,
    pub was_correction: bool,
}

/// Orders candidates by similarity to a query vector.
pub trait RankingStrategy: Send + Sync {
    /// Scores every candidate and returns them best first.
    ///
    /// Equal similarities are ordered by ascending email id. Any comparison
    /// error, including a score that is not finite, aborts the whole ranking.
    fn rank(
        &self,
        provider: &dyn EmbeddingProvider,
        query: &[f32],
        candidates: Vec<EmailEmbedding>,
    ) -> EmbeddingResult<Vec<SimilarEmail>>;
}

/// Exhaustive comparison against every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScan;

impl RankingStrategy for LinearScan {
    fn rank(
        &self,
        provider: &dyn EmbeddingProvider,
        query: &[f32],
        candidates: Vec<EmailEmbedding>,
    ) -> EmbeddingResult<Vec<SimilarEmail>> {
        let mut ranked = candidates
            .into_iter()
            .map(|candidate| {
                let similarity = provider.similarity(query, &candidate.vector)?;
                if !similarity.is_finite() {
                    return Err(EmbeddingError::NonFinite);
                }
                Ok(SimilarEmail {
                    email_id: candidate.email_id,
                    folder: candidate.folder,
                    similarity,
                    was_correction: candidate.is_correction,
                })
            })
            .collect::<EmbeddingResult<Vec<_>>>()?;

        ranked.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then(a.email_id.cmp(&b.email_id))
        });
        Ok(ranked)
    }
}

/// Indexes emails and finds their nearest stored neighbors.
pub struct SimilarityEngine<S: EmbeddingStore> {
    provider: Arc<dyn EmbeddingProvider>,
    store: S,
    strategy: Box<dyn RankingStrategy>,
}

impl<S: EmbeddingStore> SimilarityEngine<S> {
    /// Creates an engine that ranks with [`LinearScan`].
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: S) -> Self {
        Self::with_strategy(provider, store, Box::new(LinearScan))
    }

    /// Creates an engine with a custom ranking strategy.
    pub fn with_strategy(
        provider: Arc<dyn EmbeddingProvider>,
        store: S,
        strategy: Box<dyn RankingStrategy>,
    ) -> Self {
        Self {
            provider,
            store,
            strategy,
        }
    }

    /// Returns the embedding provider.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Finds the `top_k` stored emails most similar to `query_text`.
    ///
    /// Only embeddings of the provider's current model are considered. The
    /// candidate set is fetched before the query is embedded, so an empty
    /// corpus returns immediately without any inference.
    pub async fn find_similar(
        &self,
        query_text: &str,
        top_k: usize,
        scope: &SearchScope,
    ) -> Result<Vec<SimilarEmail>> {
        let model = self.provider.model();
        let candidates = self.store.find_all(Some(model), scope).await?;

        if candidates.is_empty() {
            tracing::debug!(model = %model, "No stored embeddings, skipping search");
            return Ok(Vec::new());
        }

        let query = self.provider.embed(query_text).await?;
        let total = candidates.len();
        let mut ranked = self
            .strategy
            .rank(self.provider.as_ref(), &query, candidates)?;
        ranked.truncate(top_k);

        tracing::debug!(
            model = %model,
            candidates = total,
            top_k,
            returned = ranked.len(),
            "Similarity search complete"
        );
        Ok(ranked)
    }

    /// Embeds `text` and stores it as the email's embedding for the current
    /// model, replacing any earlier one.
    pub async fn index_email(
        &self,
        email_id: EmailId,
        text: &str,
        folder: &str,
        is_correction: bool,
    ) -> Result<()> {
        let vector = self.provider.embed(text).await?;
        let embedding = NewEmbedding::new(email_id, vector, self.provider.model().clone(), folder)
            .as_correction(is_correction);

        self.store.save(embedding).await?;

        tracing::debug!(
            email_id = email_id.0,
            model = %self.provider.model(),
            folder,
            is_correction,
            "Indexed email"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelId;
    use crate::embedding::{HashingProvider, MockEmbeddingProvider, ModelType};
    use crate::triage::{InMemoryEmbeddingStore, TriageError};
    use pretty_assertions::assert_eq;

    fn engine() -> SimilarityEngine<InMemoryEmbeddingStore> {
        SimilarityEngine::new(Arc::new(HashingProvider::new()), InMemoryEmbeddingStore::new())
    }

    /// Provider that maps fixed texts to fixed vectors.
    fn fixed_provider(pairs: &'static [(&'static str, &'static [f32])]) -> MockEmbeddingProvider {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_model()
            .return_const(ModelType::Hashing384.model_id());
        provider.expect_embed().returning(move |text| {
            Ok(pairs
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, v)| v.to_vec())
                .unwrap_or_default())
        });
        provider
            .expect_similarity()
            .returning(|a, b| crate::embedding::cosine_similarity(a, b));
        provider
    }

    #[tokio::test]
    async fn empty_corpus_skips_embedding() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_model()
            .return_const(ModelType::Hashing384.model_id());
        provider.expect_embed().times(0);

        let engine = SimilarityEngine::new(Arc::new(provider), InMemoryEmbeddingStore::new());
        let results = engine
            .find_similar("anything", 5, &SearchScope::All)
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn index_email_is_an_upsert() {
        let engine = engine();
        engine.index_email(EmailId(1), "a", "INBOX", false).await.unwrap();
        engine.index_email(EmailId(1), "b", "Feed", true).await.unwrap();

        assert_eq!(engine.store().count(None).await.unwrap(), 1);
        let row = engine
            .store()
            .find_by_email(EmailId(1), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.folder, "Feed");
        assert!(row.is_correction);
    }

    #[tokio::test]
    async fn results_sorted_and_truncated() {
        static PAIRS: &[(&str, &[f32])] = &[
            ("query", &[1.0, 0.0]),
            ("exact", &[1.0, 0.0]),
            ("close", &[0.8, 0.6]),
            ("far", &[0.0, 1.0]),
        ];
        let engine = SimilarityEngine::new(
            Arc::new(fixed_provider(PAIRS)),
            InMemoryEmbeddingStore::new(),
        );
        engine.index_email(EmailId(3), "far", "C", false).await.unwrap();
        engine.index_email(EmailId(1), "exact", "A", false).await.unwrap();
        engine.index_email(EmailId(2), "close", "B", true).await.unwrap();

        let top2 = engine.find_similar("query", 2, &SearchScope::All).await.unwrap();
        assert_eq!(
            top2.iter().map(|r| r.email_id).collect::<Vec<_>>(),
            vec![EmailId(1), EmailId(2)]
        );
        assert!(top2[1].was_correction);
        assert!((top2[1].similarity - 0.8).abs() < 1e-5);

        let all = engine.find_similar("query", 10, &SearchScope::All).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].similarity >= w[1].similarity));

        assert!(engine
            .find_similar("query", 0, &SearchScope::All)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn ties_break_by_email_id() {
        static PAIRS: &[(&str, &[f32])] = &[("q", &[1.0, 0.0]), ("same", &[1.0, 0.0])];
        let engine =
            SimilarityEngine::new(Arc::new(fixed_provider(PAIRS)), InMemoryEmbeddingStore::new());
        for id in [9, 4, 7] {
            engine.index_email(EmailId(id), "same", "INBOX", false).await.unwrap();
        }

        let ids: Vec<_> = engine
            .find_similar("q", 5, &SearchScope::All)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.email_id)
            .collect();
        assert_eq!(ids, vec![EmailId(4), EmailId(7), EmailId(9)]);
    }

    #[tokio::test]
    async fn dimension_mismatch_aborts_search() {
        let engine = engine();
        engine.index_email(EmailId(1), "hello", "INBOX", false).await.unwrap();
        engine
            .store()
            .save(NewEmbedding::new(
                EmailId(2),
                vec![1.0, 0.0],
                ModelType::Hashing384.model_id(),
                "Stale",
            ))
            .await
            .unwrap();

        let err = engine
            .find_similar("hello", 5, &SearchScope::All)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TriageError::Embedding(EmbeddingError::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn other_models_are_ignored() {
        let engine = engine();
        engine
            .store()
            .save(NewEmbedding::new(
                EmailId(1),
                vec![1.0, 0.0],
                ModelId::new("acme/other").unwrap(),
                "Elsewhere",
            ))
            .await
            .unwrap();

        let results = engine.find_similar("hello", 5, &SearchScope::All).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn nan_rows_abort_search() {
        let provider = HashingProvider::new();
        let engine = engine();
        for id in 0..200 {
            let mut vector = provider.embed_sync(&format!("common{} word{}", id % 5, id % 7));
            if id % 3 == 0 {
                vector[0] = f32::NAN;
            }
            engine
                .store()
                .save(NewEmbedding::new(
                    EmailId(id),
                    vector,
                    ModelType::Hashing384.model_id(),
                    "INBOX",
                ))
                .await
                .unwrap();
        }

        let err = engine
            .find_similar("common3 word5", 5, &SearchScope::All)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TriageError::Embedding(EmbeddingError::NonFinite)
        ));
    }

    fn candidate(id: i64, vector: Vec<f32>) -> EmailEmbedding {
        EmailEmbedding {
            id: crate::domain::EmbeddingId(id),
            email_id: EmailId(id),
            vector,
            model: ModelType::Hashing384.model_id(),
            folder: "INBOX".to_string(),
            is_correction: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn linear_scan_rejects_non_finite_scores() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_similarity().returning(|_, b| {
            if b[0] == 17.0 {
                Ok(f32::NAN)
            } else {
                Ok(b[0] / 100.0)
            }
        });
        let candidates = (0..40).map(|id| candidate(id, vec![id as f32])).collect();

        let result = LinearScan.rank(&provider, &[1.0], candidates);
        assert!(matches!(result, Err(EmbeddingError::NonFinite)));
    }

    #[test]
    fn linear_scan_orders_large_candidate_sets() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_similarity()
            .returning(|_, b| Ok(f32::from(b[0] as u8 % 4) / 4.0));
        let candidates = (0..64)
            .rev()
            .map(|id| candidate(id, vec![id as f32]))
            .collect();

        let ranked = LinearScan.rank(&provider, &[1.0], candidates).unwrap();
        assert_eq!(ranked.len(), 64);
        assert!(ranked.windows(2).all(|w| {
            w[0].similarity > w[1].similarity
                || (w[0].similarity == w[1].similarity && w[0].email_id < w[1].email_id)
        }));
        assert_eq!(ranked[0].email_id, EmailId(3));
    }

    #[test]
    fn linear_scan_propagates_first_error() {
        let provider = HashingProvider::new();
        let candidates = vec![candidate(1, vec![1.0])];

        let result = LinearScan.rank(&provider, &[1.0, 0.0], candidates);
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
