//! Triage service for cheap, offline folder suggestions.
//!
//! Classification code calls this service whenever an email is filed or
//! corrected, and asks it for a first-pass folder suggestion before (or
//! alongside) any LLM-based classification.

use std::sync::Arc;

use crate::config::TriageSettings;
use crate::domain::EmailId;
use crate::embedding::{prepare_text, EmbeddingProvider, ModelInfo, SharedProvider};
use crate::triage::{
    calculate_confidence, EmbeddingStore, FolderSuggestion, Result, SearchScope, SimilarityEngine,
};

/// Service that indexes filed emails and suggests folders for new ones.
pub struct TriageService<S: EmbeddingStore> {
    engine: SimilarityEngine<S>,
    settings: TriageSettings,
}

impl<S: EmbeddingStore> TriageService<S> {
    /// Creates a triage service around an existing engine.
    pub fn new(engine: SimilarityEngine<S>, settings: TriageSettings) -> Self {
        Self { engine, settings }
    }

    /// Creates a triage service whose provider is loaded lazily for the
    /// configured model.
    pub fn from_settings(settings: TriageSettings, store: S) -> Self {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(SharedProvider::for_model(
            settings.model,
            settings.model_dir.clone(),
        ));
        let info = ModelInfo::for_model(settings.model);
        tracing::info!(
            model = %provider.model(),
            name = info.name,
            download_bytes = info.size_bytes,
            top_k = settings.top_k,
            enabled = settings.enabled,
            "Triage service configured"
        );
        Self::new(SimilarityEngine::new(provider, store), settings)
    }

    /// Returns the service settings.
    pub fn settings(&self) -> &TriageSettings {
        &self.settings
    }

    /// Returns the underlying similarity engine.
    pub fn engine(&self) -> &SimilarityEngine<S> {
        &self.engine
    }

    /// Records the folder an email was filed into.
    ///
    /// Returns `false` without touching the store when the email has neither
    /// subject nor snippet.
    pub async fn index_email(
        &self,
        email_id: EmailId,
        subject: &str,
        snippet: &str,
        folder: &str,
        is_correction: bool,
    ) -> Result<bool> {
        let text = prepare_text(subject, snippet);
        if text.is_empty() {
            tracing::debug!(email_id = email_id.0, "Email has no text, not indexing");
            return Ok(false);
        }

        self.engine
            .index_email(email_id, &text, folder, is_correction)
            .await?;
        Ok(true)
    }

    /// Records a user moving an email into `folder`.
    pub async fn record_correction(
        &self,
        email_id: EmailId,
        subject: &str,
        snippet: &str,
        folder: &str,
    ) -> Result<bool> {
        self.index_email(email_id, subject, snippet, folder, true)
            .await
    }

    /// Suggests a folder for an email from its nearest indexed neighbors.
    ///
    /// Returns `None` when triage is disabled, the email has no text, nothing
    /// is indexed, or the best vote falls below `min_confidence`.
    pub async fn suggest_folder(
        &self,
        subject: &str,
        snippet: &str,
        scope: &SearchScope,
    ) -> Result<Option<FolderSuggestion>> {
        if !self.settings.enabled {
            return Ok(None);
        }

        let text = prepare_text(subject, snippet);
        if text.is_empty() {
            tracing::debug!("Email has no text, no suggestion");
            return Ok(None);
        }

        let neighbors = self
            .engine
            .find_similar(&text, self.settings.top_k, scope)
            .await?;

        let suggestion = calculate_confidence(&neighbors)
            .filter(|s| s.confidence >= self.settings.min_confidence);

        if let Some(s) = &suggestion {
            tracing::debug!(
                folder = %s.folder,
                confidence = s.confidence,
                neighbors = neighbors.len(),
                "Folder suggested"
            );
        }
        Ok(suggestion)
    }

    /// Drops every stored embedding of an email.
    pub async fn forget_email(&self, email_id: EmailId) -> Result<()> {
        self.engine.store().delete(email_id).await?;
        Ok(())
    }

    /// Number of emails indexed under the active model.
    pub async fn indexed_count(&self) -> Result<usize> {
        let model = self.engine.provider().model();
        Ok(self.engine.store().count(Some(model)).await?)
    }
}
