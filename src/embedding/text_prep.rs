//! Text preparation for embedding generation.

/// Maximum number of characters fed to the embedding provider.
pub const MAX_TEXT_CHARS: usize = 400;

/// Builds the embedding input for an email from its subject and snippet.
///
/// Subject and snippet are joined by a single space and trimmed, then cut
/// to the first [`MAX_TEXT_CHARS`] characters. The cut is a plain prefix;
/// it does not look for word boundaries.
pub fn prepare_text(subject: &str, snippet: &str) -> String {
    let joined = format!("{subject} {snippet}");
    truncate_chars(joined.trim(), MAX_TEXT_CHARS).to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
