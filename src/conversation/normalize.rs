//! Text normalization and duplicate detection
//!
//! Utterances and replies are compared in canonical form: lowercased, with
//! everything except word characters and whitespace removed, and trimmed.

/// Canonicalize text for comparison
///
/// Total and idempotent: empty input yields empty output.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Check whether two texts are the same after normalization
///
/// Returns `false` when either side is empty, so an absent history entry never
/// matches anything.
#[must_use]
pub fn is_similar(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }

    normalize(a) == normalize(b)
}
