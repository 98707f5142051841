// src/search/fuzzy.rs
// =============================================================================
// Free-text matching of a query against a repository.
//
// Two stages:
// 1. Case-insensitive substring search over name, full name, language,
//    description and topics. Any hit matches.
// 2. Only if that fails and the query is long enough (6+ letters/digits),
//    a bounded Levenshtein distance against the repository name and the
//    full name, so "reposhowcse" still finds "repo-showcase".
//
// The distance routine gives up as soon as a whole DP row is above the
// threshold: from then on the distance can only grow.
// =============================================================================

use crate::github::Repository;

const MIN_FUZZY_LEN: usize = 6;
const LONG_QUERY_LEN: usize = 12;

/// Whether `repo` matches the free-text `query`. Blank queries match all.
pub fn matches(repo: &Repository, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    if substring_hit(repo, &needle) {
        return true;
    }

    let normalized = normalize(&needle);
    let length = normalized.chars().count();
    if length < MIN_FUZZY_LEN {
        return false;
    }

    let threshold = if length < LONG_QUERY_LEN { 2 } else { 3 };

    [normalize(&repo.name), normalize(&repo.full_name)]
        .iter()
        .any(|candidate| bounded_levenshtein(&normalized, candidate, threshold).is_some())
}

fn substring_hit(repo: &Repository, needle: &str) -> bool {
    let fields = [
        Some(repo.name.as_str()),
        Some(repo.full_name.as_str()),
        repo.language.as_deref(),
        repo.description.as_deref(),
    ];

    fields
        .into_iter()
        .flatten()
        .chain(repo.topics.iter().map(String::as_str))
        .any(|field| field.to_lowercase().contains(needle))
}

// Lowercase letters and digits only
fn normalize(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Levenshtein distance between `a` and `b`, or None once it exceeds `max`.
pub fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for (j, cb) in b.iter().enumerate() {
            let substitution = if ca == cb { prev[j] } else { prev[j] + 1 };
            let insertion = curr[j] + 1;
            let deletion = prev[j + 1] + 1;
            curr[j + 1] = substitution.min(insertion).min(deletion);
            row_min = row_min.min(curr[j + 1]);
        }

        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= max).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::repo_json;
    use serde_json::json;

    fn repo() -> Repository {
        let mut value = repo_json("repo-showcase", 1, "2025-05-01T00:00:00Z");
        value["topics"] = json!(["portfolio", "github-api"]);
        value["description"] = json!("Ranks and searches repositories");
        Repository::from_value(&value).unwrap()
    }

    #[test]
    fn test_blank_query_matches_everything() {
        assert!(matches(&repo(), ""));
        assert!(matches(&repo(), "   "));
    }

    #[test]
    fn test_exact_name_always_matches() {
        let repo = repo();
        assert!(matches(&repo, &repo.name));
        assert!(matches(&repo, &repo.full_name));
    }

    #[test]
    fn test_substring_fields() {
        let repo = repo();
        assert!(matches(&repo, "SHOWCASE"));
        assert!(matches(&repo, "rust"));
        assert!(matches(&repo, "portfolio"));
        assert!(matches(&repo, "searches"));
    }

    #[test]
    fn test_typo_within_threshold() {
        assert!(matches(&repo(), "reposhowcse"));
        assert!(matches(&repo(), "repo showacse"));
    }

    #[test]
    fn test_short_query_never_uses_edit_distance() {
        let mut value = repo_json("xyw", 1, "2025-05-01T00:00:00Z");
        value["description"] = json!(null);
        value["topics"] = json!([]);
        let repo = Repository::from_value(&value).unwrap();

        // One edit away from the name, but only 3 characters long
        assert!(!matches(&repo, "xyz"));
    }

    #[test]
    fn test_far_query_does_not_match() {
        assert!(!matches(&repo(), "kubernetes"));
    }

    #[test]
    fn test_bounded_levenshtein() {
        assert_eq!(bounded_levenshtein("kitten", "sitting", 3), Some(3));
        assert_eq!(bounded_levenshtein("kitten", "sitting", 2), None);
        assert_eq!(bounded_levenshtein("same", "same", 0), Some(0));
        assert_eq!(bounded_levenshtein("", "ab", 2), Some(2));
        assert_eq!(bounded_levenshtein("a", "abcdef", 2), None);
    }

    #[test]
    fn test_row_minimum_cutoff_agrees_with_full_distance() {
        // Same length, so the length check does not short-circuit
        assert_eq!(bounded_levenshtein("abcdef", "uvwxyz", 2), None);
        assert_eq!(bounded_levenshtein("abcdef", "abcxyz", 3), Some(3));
    }
}
