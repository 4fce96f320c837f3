//! In-memory embedding store.
//!
//! Keeps rows in insertion order behind an async `RwLock`. Useful for tests
//! and for running triage without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{AccountId, EmailEmbedding, EmailId, EmbeddingId, ModelId, NewEmbedding};
use crate::triage::store::{EmbeddingStore, Result, SearchScope};

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<EmailEmbedding>,
    owners: HashMap<EmailId, AccountId>,
    next_id: i64,
}

/// Embedding store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryEmbeddingStore {
    inner: RwLock<Inner>,
}

impl InMemoryEmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records which account owns an email, for account-scoped queries.
    pub async fn assign_account(&self, email_id: EmailId, account_id: AccountId) {
        self.inner.write().await.owners.insert(email_id, account_id);
    }
}

fn newest_first(rows: &mut [EmailEmbedding]) {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl EmbeddingStore for InMemoryEmbeddingStore {
    async fn find_by_email(
        &self,
        email_id: EmailId,
        model: Option<&ModelId>,
    ) -> Result<Option<EmailEmbedding>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<EmailEmbedding> = inner
            .rows
            .iter()
            .filter(|row| row.email_id == email_id)
            .filter(|row| model.map_or(true, |m| &row.model == m))
            .cloned()
            .collect();

        newest_first(&mut matches);
        Ok(matches.into_iter().next())
    }

    async fn find_all(
        &self,
        model: Option<&ModelId>,
        scope: &SearchScope,
    ) -> Result<Vec<EmailEmbedding>> {
        let inner = self.inner.read().await;
        let account = scope.account();

        let mut rows: Vec<EmailEmbedding> = inner
            .rows
            .iter()
            .filter(|row| model.map_or(true, |m| &row.model == m))
            .filter(|row| account.map_or(true, |a| inner.owners.get(&row.email_id) == Some(a)))
            .cloned()
            .collect();

        newest_first(&mut rows);
        Ok(rows)
    }

    async fn save(&self, embedding: NewEmbedding) -> Result<EmailEmbedding> {
        let mut inner = self.inner.write().await;

        if let Some(row) = inner
            .rows
            .iter_mut()
            .find(|row| row.email_id == embedding.email_id && row.model == embedding.model)
        {
            row.vector = embedding.vector;
            row.folder = embedding.folder;
            row.is_correction = embedding.is_correction;
            return Ok(row.clone());
        }

        inner.next_id += 1;
        let row = EmailEmbedding {
            id: EmbeddingId(inner.next_id),
            email_id: embedding.email_id,
            vector: embedding.vector,
            model: embedding.model,
            folder: embedding.folder,
            is_correction: embedding.is_correction,
            created_at: Utc::now(),
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, email_id: EmailId) -> Result<()> {
        self.inner
            .write()
            .await
            .rows
            .retain(|row| row.email_id != email_id);
        Ok(())
    }

    async fn count(&self, model: Option<&ModelId>) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .filter(|row| model.map_or(true, |m| &row.model == m))
            .count())
    }
}
