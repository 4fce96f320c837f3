//! Email embedding database queries.
//!
//! Rows are returned with the raw vector blob; decoding is left to the caller
//! so corrupt blobs surface as codec errors rather than SQL errors.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

/// An `email_embeddings` row with its vector still encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRow {
    pub id: i64,
    pub email_id: i64,
    pub embedding: Vec<u8>,
    pub model: String,
    pub folder: String,
    pub is_correction: bool,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "e.id, e.email_id, e.embedding, e.model, e.folder, e.is_correction, e.created_at";

fn map_row(row: &Row<'_>) -> Result<EmbeddingRow> {
    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(EmbeddingRow {
        id: row.get(0)?,
        email_id: row.get(1)?,
        embedding: row.get(2)?,
        model: row.get(3)?,
        folder: row.get(4)?,
        is_correction: row.get(5)?,
        created_at,
    })
}

/// Formats a timestamp so that text ordering matches time ordering.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Inserts an embedding, or overwrites vector, folder and correction flag
/// of the existing row for the same (email, model). `created_at` is only
/// written on insert.
pub fn upsert(
    conn: &Connection,
    email_id: i64,
    embedding: &[u8],
    model: &str,
    folder: &str,
    is_correction: bool,
    now: &DateTime<Utc>,
) -> Result<EmbeddingRow> {
    conn.query_row(
        "INSERT INTO email_embeddings (email_id, embedding, model, folder, is_correction, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(email_id, model) DO UPDATE SET
             embedding = excluded.embedding,
             folder = excluded.folder,
             is_correction = excluded.is_correction
         RETURNING id, email_id, embedding, model, folder, is_correction, created_at",
        params![
            email_id,
            embedding,
            model,
            folder,
            is_correction,
            format_timestamp(now)
        ],
        map_row,
    )
}

/// Gets the embedding for an email under a specific model.
pub fn get_by_email_and_model(
    conn: &Connection,
    email_id: i64,
    model: &str,
) -> Result<Option<EmbeddingRow>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM email_embeddings e WHERE e.email_id = ?1 AND e.model = ?2"),
        params![email_id, model],
        map_row,
    )
    .optional()
}

/// Gets the most recently created embedding for an email across all models.
pub fn get_latest_by_email(conn: &Connection, email_id: i64) -> Result<Option<EmbeddingRow>> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM email_embeddings e WHERE e.email_id = ?1
             ORDER BY e.created_at DESC, e.id DESC LIMIT 1"
        ),
        params![email_id],
        map_row,
    )
    .optional()
}

/// Lists embeddings, newest first, optionally filtered by model and by the
/// account owning the email.
pub fn list(
    conn: &Connection,
    model: Option<&str>,
    account_id: Option<&str>,
) -> Result<Vec<EmbeddingRow>> {
    let sql = match account_id {
        None => format!(
            "SELECT {COLUMNS} FROM email_embeddings e
             WHERE (?1 IS NULL OR e.model = ?1)
             ORDER BY e.created_at DESC, e.id DESC"
        ),
        Some(_) => format!(
            "SELECT {COLUMNS} FROM email_embeddings e
             JOIN emails m ON m.id = e.email_id
             WHERE (?1 IS NULL OR e.model = ?1) AND m.account_id = ?2
             ORDER BY e.created_at DESC, e.id DESC"
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = match account_id {
        None => stmt.query_map(params![model], map_row)?,
        Some(account_id) => stmt.query_map(params![model, account_id], map_row)?,
    };

    rows.collect()
}

/// Deletes every embedding of an email. Returns the number of rows removed.
pub fn delete_by_email(conn: &Connection, email_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM email_embeddings WHERE email_id = ?1",
        params![email_id],
    )
}

/// Counts embeddings, optionally filtered by model.
///
/// A count that does not fit in `usize` is a conversion error.
pub fn count(conn: &Connection, model: Option<&str>) -> Result<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM email_embeddings WHERE (?1 IS NULL OR model = ?1)",
        params![model],
        |row| row.get(0),
    )
}
