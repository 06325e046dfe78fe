//! Fuzzy string matching over normalized company names and job titles.
//!
//! Everything here is a pure function with fixed behavior so matching
//! decisions are reproducible.

use std::collections::HashSet;

use strsim::normalized_levenshtein;

/// Tokens dropped from the end of company names before comparison.
const COMPANY_SUFFIX_TOKENS: &[&str] = &[
    "inc", "incorporated", "llc", "ltd", "limited", "corp", "corporation", "co", "company",
    "gmbh", "plc", "sa", "ag", "bv", "llp", "pty",
];

/// Lowercase, replace punctuation with spaces and collapse whitespace.
pub fn normalize_text(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a company name, dropping trailing legal-form tokens.
pub fn normalize_company(input: &str) -> String {
    let normalized = normalize_text(input);
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| COMPANY_SUFFIX_TOKENS.contains(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

/// Similarity of two already-normalized strings in [0, 1].
///
/// The larger of the normalized Levenshtein similarity and the token
/// Sørensen-Dice coefficient, so both typos and reordered words score high.
pub fn similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let edit = normalized_levenshtein(a, b) as f32;
    edit.max(token_overlap(a, b))
}

/// Similarity of two raw job titles.
pub fn title_similarity(a: &str, b: &str) -> f32 {
    similarity(&normalize_text(a), &normalize_text(b))
}

/// Similarity of two raw company names.
pub fn company_similarity(a: &str, b: &str) -> f32 {
    similarity(&normalize_company(a), &normalize_company(b))
}

/// Whether two locations are equal after normalization. Two missing
/// locations count as equal.
pub fn locations_equal(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => normalize_text(a) == normalize_text(b),
        (None, None) => true,
        _ => false,
    }
}

fn token_overlap(a: &str, b: &str) -> f32 {
    let ta: HashSet<&str> = a.split(' ').collect();
    let tb: HashSet<&str> = b.split(' ').collect();
    let shared = ta.intersection(&tb).count();
    (2 * shared) as f32 / (ta.len() + tb.len()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Sr. Back-End   Engineer!"), "sr back end engineer");
    }

    #[test]
    fn test_normalize_company_strips_legal_forms() {
        assert_eq!(normalize_company("Acme, Inc."), "acme");
        assert_eq!(normalize_company("Acme Holdings Co. Ltd"), "acme holdings");
        assert_eq!(normalize_company("Inc"), "inc");
    }

    #[test]
    fn test_company_similarity() {
        assert_eq!(company_similarity("ACME Inc.", "Acme"), 1.0);
        assert!(company_similarity("Acme Robotics", "Acme Robotcs") > 0.85);
        assert!(company_similarity("Acme", "Globex") < 0.5);
    }

    #[test]
    fn test_title_similarity_handles_reordering() {
        assert!(title_similarity("Engineer, Senior Backend", "Senior Backend Engineer") >= 0.99);
        assert!(title_similarity("Senior Backend Engineer", "Marketing Manager") < 0.5);
        assert_eq!(title_similarity("", "Engineer"), 0.0);
    }

    #[test]
    fn test_locations_equal() {
        assert!(locations_equal(Some("Austin, TX"), Some("austin tx")));
        assert!(locations_equal(None, None));
        assert!(!locations_equal(Some("Austin"), None));
    }
}
