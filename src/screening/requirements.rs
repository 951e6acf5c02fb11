/// Tolerant decoder for list fields stored as either a JSON array or a
/// comma-separated string (job requirements, per-experience skills).
///
/// The encoding is ambiguous at the store, so every parse-or-fallback
/// decision lives here and nowhere else: a JSON array decodes directly,
/// anything else is comma-split, and a value with no commas comes back as a
/// single-element list holding the raw string. Never errors.
pub fn parse_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        if let Ok(values) = serde_json::from_str::<Vec<String>>(trimmed) {
            return values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
        }
        // Malformed JSON falls through to the comma split below.
    }

    trimmed
        .split(',')
        .map(clean_token)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Strip whitespace and stray quote/bracket characters left behind by a
/// half-encoded JSON value.
fn clean_token(token: &str) -> String {
    token
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '[' || c == ']')
        .trim()
        .to_string()
}
