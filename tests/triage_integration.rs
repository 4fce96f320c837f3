//! Integration tests for semantic triage.
//!
//! These tests exercise the engine across module boundaries: provider,
//! SQLite store, similarity search and folder voting. Each module contains
//! its own unit tests for detailed logic.

use std::sync::Arc;

use margin_triage::config::TriageSettings;
use margin_triage::domain::{AccountId, EmailId};
use margin_triage::embedding::{EmbeddingProvider, HashingProvider, ModelType, SharedProvider};
use margin_triage::storage::Database;
use margin_triage::triage::{
    calculate_confidence, EmbeddingStore, InMemoryEmbeddingStore, SearchScope, SimilarEmail,
    SimilarityEngine, SqliteEmbeddingStore,
};
use margin_triage::TriageService;
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn sqlite_engine() -> SimilarityEngine<SqliteEmbeddingStore> {
    init_tracing();
    let db = Database::open_in_memory().await.unwrap();
    SimilarityEngine::new(
        Arc::new(HashingProvider::new()),
        SqliteEmbeddingStore::new(db),
    )
}

// ============================================================================
// End-to-end Search
// ============================================================================

#[tokio::test]
async fn payment_receipt_ranks_invoices_first() {
    let engine = sqlite_engine().await;
    engine
        .index_email(EmailId(1), "Invoice for December payment", "Paper-Trail/Invoices", false)
        .await
        .unwrap();
    engine
        .index_email(EmailId(2), "Receipt for your order", "Paper-Trail/Invoices", false)
        .await
        .unwrap();
    engine
        .index_email(EmailId(3), "Meeting scheduled for tomorrow", "INBOX", false)
        .await
        .unwrap();

    let results = engine
        .find_similar("Payment receipt", 3, &SearchScope::All)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].folder, "Paper-Trail/Invoices");

    let suggestion = calculate_confidence(&results).unwrap();
    assert_eq!(suggestion.folder, "Paper-Trail/Invoices");
    assert!(suggestion.confidence > 0.5);
}

#[tokio::test]
async fn empty_corpus_returns_nothing() {
    let engine = sqlite_engine().await;
    let results = engine
        .find_similar("anything at all", 5, &SearchScope::All)
        .await
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(calculate_confidence(&results), None);
}

#[tokio::test]
async fn over_request_returns_whole_corpus_sorted() {
    let engine = sqlite_engine().await;
    let texts = [
        "quarterly budget review",
        "budget spreadsheet attached",
        "holiday party invitation",
    ];
    for (i, text) in texts.iter().enumerate() {
        engine
            .index_email(EmailId(i as i64 + 1), text, "INBOX", false)
            .await
            .unwrap();
    }

    let results = engine
        .find_similar("budget review", 50, &SearchScope::All)
        .await
        .unwrap();

    assert_eq!(results.len(), texts.len());
    assert!(results
        .windows(2)
        .all(|pair| pair[0].similarity >= pair[1].similarity));
    assert_eq!(results[0].email_id, EmailId(1));
}

// ============================================================================
// Indexing
// ============================================================================

#[tokio::test]
async fn reindexing_keeps_one_row() {
    let engine = sqlite_engine().await;
    engine.index_email(EmailId(1), "a", "INBOX", false).await.unwrap();
    engine.index_email(EmailId(1), "b", "Feed", true).await.unwrap();

    let store = engine.store();
    assert_eq!(store.count(None).await.unwrap(), 1);

    let row = store.find_by_email(EmailId(1), None).await.unwrap().unwrap();
    assert_eq!(row.folder, "Feed");
    assert!(row.is_correction);
    assert_eq!(row.model, ModelType::Hashing384.model_id());
}

#[tokio::test]
async fn account_scope_limits_candidates() {
    let engine = sqlite_engine().await;
    engine
        .store()
        .db()
        .with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO emails (id, account_id) VALUES (1, 'work'), (2, 'personal')",
            )?;
            Ok(())
        })
        .await
        .unwrap();

    engine
        .index_email(EmailId(1), "Sprint planning notes", "Work", false)
        .await
        .unwrap();
    engine
        .index_email(EmailId(2), "Sprint planning notes", "Personal", false)
        .await
        .unwrap();

    let results = engine
        .find_similar(
            "sprint planning",
            5,
            &SearchScope::Account(AccountId::from("personal")),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].folder, "Personal");
}

// ============================================================================
// Voting
// ============================================================================

#[test]
fn correction_outvotes_equal_automatic_neighbor() {
    let neighbors = vec![
        SimilarEmail {
            email_id: EmailId(1),
            folder: "INBOX".to_string(),
            similarity: 0.7,
            was_correction: false,
        },
        SimilarEmail {
            email_id: EmailId(2),
            folder: "Feed".to_string(),
            similarity: 0.7,
            was_correction: true,
        },
    ];

    let suggestion = calculate_confidence(&neighbors).unwrap();
    assert_eq!(suggestion.folder, "Feed");
    assert!((suggestion.confidence - 0.667).abs() < 1e-3);
}

// ============================================================================
// Service
// ============================================================================

#[tokio::test]
async fn service_learns_from_corrections() {
    let service =
        TriageService::from_settings(TriageSettings::default(), InMemoryEmbeddingStore::new());

    service
        .index_email(EmailId(1), "Your weekly digest", "New posts from people you follow", "INBOX", false)
        .await
        .unwrap();
    service
        .record_correction(EmailId(1), "Your weekly digest", "New posts from people you follow", "Feed")
        .await
        .unwrap();
    service
        .index_email(EmailId(2), "Lunch tomorrow?", "Are you free at noon", "INBOX", false)
        .await
        .unwrap();

    let suggestion = service
        .suggest_folder("Your weekly digest", "Top posts", &SearchScope::All)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(suggestion.folder, "Feed");
}

#[tokio::test]
async fn shared_provider_matches_direct_provider() {
    let shared = SharedProvider::for_model(ModelType::Hashing384, None);
    let direct = HashingProvider::new();

    let a = shared.embed("Invoice for December payment").await.unwrap();
    let b = direct.embed("Invoice for December payment").await.unwrap();

    assert_eq!(a, b);
    assert_eq!(shared.model(), direct.model());
}

#[tokio::test]
async fn sqlite_store_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triage.db");

    {
        let store = SqliteEmbeddingStore::new(Database::open(&path).await.unwrap());
        let engine = SimilarityEngine::new(Arc::new(HashingProvider::new()), store);
        engine
            .index_email(EmailId(42), "Boarding pass for flight 220", "Travel", false)
            .await
            .unwrap();
    }

    let store = SqliteEmbeddingStore::new(Database::open(&path).await.unwrap());
    let engine = SimilarityEngine::new(Arc::new(HashingProvider::new()), store);
    let results = engine
        .find_similar("boarding pass", 1, &SearchScope::All)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].email_id, EmailId(42));
    assert_eq!(results[0].folder, "Travel");
}
