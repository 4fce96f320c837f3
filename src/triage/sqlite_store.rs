//! SQLite-backed embedding store.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{EmailEmbedding, EmailId, EmbeddingId, ModelId, NewEmbedding};
use crate::embedding::codec;
use crate::storage::queries::embeddings::{self, EmbeddingRow};
use crate::storage::Database;
use crate::triage::store::{EmbeddingStore, Result, SearchScope};

/// Embedding store persisted in the `email_embeddings` table.
#[derive(Debug, Clone)]
pub struct SqliteEmbeddingStore {
    db: Database,
}

impl SqliteEmbeddingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database.
    pub fn db(&self) -> &Database {
        &self.db
    }
}

fn into_embedding(row: EmbeddingRow) -> Result<EmailEmbedding> {
    Ok(EmailEmbedding {
        id: EmbeddingId(row.id),
        email_id: EmailId(row.email_id),
        vector: codec::decode(&row.embedding)?,
        model: ModelId::new(row.model).map_err(crate::embedding::EmbeddingError::from)?,
        folder: row.folder,
        is_correction: row.is_correction,
        created_at: row.created_at,
    })
}

#[async_trait]
impl EmbeddingStore for SqliteEmbeddingStore {
    async fn find_by_email(
        &self,
        email_id: EmailId,
        model: Option<&ModelId>,
    ) -> Result<Option<EmailEmbedding>> {
        let model = model.map(|m| m.as_str().to_owned());
        let row = self
            .db
            .with_conn(move |conn| {
                let row = match &model {
                    Some(model) => embeddings::get_by_email_and_model(conn, email_id.0, model)?,
                    None => embeddings::get_latest_by_email(conn, email_id.0)?,
                };
                Ok(row)
            })
            .await?;

        row.map(into_embedding).transpose()
    }

    async fn find_all(
        &self,
        model: Option<&ModelId>,
        scope: &SearchScope,
    ) -> Result<Vec<EmailEmbedding>> {
        let model = model.map(|m| m.as_str().to_owned());
        let account = scope.account().map(|a| a.0.clone());
        let rows = self
            .db
            .with_conn(move |conn| {
                Ok(embeddings::list(
                    conn,
                    model.as_deref(),
                    account.as_deref(),
                )?)
            })
            .await?;

        rows.into_iter().map(into_embedding).collect()
    }

    async fn save(&self, embedding: NewEmbedding) -> Result<EmailEmbedding> {
        let blob = codec::encode(&embedding.vector);
        let now = Utc::now();
        let row = self
            .db
            .with_conn(move |conn| {
                Ok(embeddings::upsert(
                    conn,
                    embedding.email_id.0,
                    &blob,
                    embedding.model.as_str(),
                    &embedding.folder,
                    embedding.is_correction,
                    &now,
                )?)
            })
            .await?;

        tracing::debug!(
            email_id = row.email_id,
            model = %row.model,
            folder = %row.folder,
            "Saved embedding"
        );
        into_embedding(row)
    }

    async fn delete(&self, email_id: EmailId) -> Result<()> {
        let removed = self
            .db
            .with_conn(move |conn| Ok(embeddings::delete_by_email(conn, email_id.0)?))
            .await?;

        tracing::debug!(email_id = email_id.0, removed, "Deleted embeddings");
        Ok(())
    }

    async fn count(&self, model: Option<&ModelId>) -> Result<usize> {
        let model = model.map(|m| m.as_str().to_owned());
        Ok(self
            .db
            .with_conn(move |conn| Ok(embeddings::count(conn, model.as_deref())?))
            .await?)
    }
}
