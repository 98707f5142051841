// src/rank/mod.rs
// =============================================================================
// The ranking engine: which repositories are showcase-ready and in what
// order they are shown.
//
// Everything in here is a pure function of its inputs (plus "now"), so the
// render coordinator can call it as often as it likes.
// =============================================================================

mod order;
mod score;

use chrono::{DateTime, Utc};

use crate::github::Repository;
use crate::search;

pub use order::{sort_repos, SortKey};
pub use score::{is_showcase_eligible, refresh_scores};

/// Eligible repositories matching `query`, scored and sorted.
pub fn showcase_view(
    catalog: &[Repository],
    query: &str,
    key: SortKey,
    featured: &[String],
    now: DateTime<Utc>,
) -> Vec<Repository> {
    let mut view: Vec<Repository> = catalog
        .iter()
        .filter(|repo| is_showcase_eligible(repo))
        .filter(|repo| search::matches(repo, query))
        .cloned()
        .collect();

    rescore(&mut view, key, featured, now);
    view
}

/// Re-scores and re-sorts in place, e.g. after activity arrived.
pub fn rescore(repos: &mut [Repository], key: SortKey, featured: &[String], now: DateTime<Utc>) {
    refresh_scores(repos, now);
    sort_repos(repos, key, featured);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed_now, repo_json};
    use serde_json::json;

    fn catalog() -> Vec<Repository> {
        let mut repos: Vec<Repository> = vec![
            repo_json("quiet", 0, "2025-05-20T00:00:00Z"),
            repo_json("famous", 50, "2025-01-20T00:00:00Z"),
            json!({"name": "forked", "owner": {"login": "octo"}, "fork": true, "stargazers_count": 99}),
            json!({"name": "octo", "owner": {"login": "octo"}, "description": "profile"}),
        ]
        .iter()
        .map(|v| Repository::from_value(v).unwrap())
        .collect();
        for (i, repo) in repos.iter_mut().enumerate() {
            repo.catalog_index = i;
        }
        repos
    }

    #[test]
    fn test_view_filters_and_sorts() {
        let view = showcase_view(&catalog(), "", SortKey::Popular, &[], fixed_now());
        let names: Vec<_> = view.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["famous", "quiet"]);
        assert!(view.iter().all(|r| r.showcase_score > 0.0));
    }

    #[test]
    fn test_view_applies_query() {
        let view = showcase_view(&catalog(), "QUIET", SortKey::Popular, &[], fixed_now());
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].name, "quiet");
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(showcase_view(&catalog(), "kubernetes", SortKey::Popular, &[], fixed_now()).is_empty());
    }
}
