//! SQL schema definitions as const strings.

/// SQL to create the embeddings table.
///
/// `embedding` holds little-endian `f32` values. One row per (email, model).
pub const CREATE_EMAIL_EMBEDDINGS: &str = r#"
CREATE TABLE IF NOT EXISTS email_embeddings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email_id INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    model TEXT NOT NULL,
    folder TEXT NOT NULL,
    is_correction INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE(email_id, model)
)
"#;

/// SQL to create embedding indexes.
pub const CREATE_EMAIL_EMBEDDING_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_email_embeddings_model ON email_embeddings(model);
CREATE INDEX IF NOT EXISTS idx_email_embeddings_email ON email_embeddings(email_id)
"#;

/// SQL to create the email ownership table used for account-scoped queries.
///
/// The mail store owns the full email records; only the columns needed to
/// scope embeddings by account are declared here.
pub const CREATE_EMAILS: &str = r#"
CREATE TABLE IF NOT EXISTS emails (
    id INTEGER PRIMARY KEY,
    account_id TEXT NOT NULL
)
"#;

/// SQL to create the email account index.
pub const CREATE_EMAILS_ACCOUNT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_emails_account ON emails(account_id)
"#;

/// Returns all schema creation statements in order.
pub fn all_migrations() -> Vec<&'static str> {
    vec![
        CREATE_EMAILS,
        CREATE_EMAILS_ACCOUNT_INDEX,
        CREATE_EMAIL_EMBEDDINGS,
        CREATE_EMAIL_EMBEDDING_INDEXES,
    ]
}
