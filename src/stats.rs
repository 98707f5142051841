// src/stats.rs
// =============================================================================
// Catalog-wide statistics for the `stats` command.
//
// These are computed over the whole catalog (forks and archived repositories
// included), the same numbers a profile's summary bar would show.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::github::Repository;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total_repos: usize,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Repositories per primary language, alphabetical
    pub languages: BTreeMap<String, usize>,
    pub most_starred: Option<String>,
    pub recently_updated: Option<String>,
}

impl CatalogStats {
    pub fn from_catalog(repos: &[Repository]) -> Self {
        let mut languages = BTreeMap::new();
        for language in repos.iter().filter_map(|r| r.language.as_ref()) {
            *languages.entry(language.clone()).or_insert(0) += 1;
        }

        // On equal stars the earlier catalog entry (more recently updated) wins
        let most_starred = repos
            .iter()
            .filter(|r| r.stars > 0)
            .min_by(|a, b| b.stars.cmp(&a.stars).then(a.catalog_index.cmp(&b.catalog_index)))
            .map(|r| r.full_name.clone());

        let recently_updated = repos
            .iter()
            .filter(|r| r.updated_at.is_some())
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(b.catalog_index.cmp(&a.catalog_index)))
            .map(|r| r.full_name.clone());

        Self {
            total_repos: repos.len(),
            total_stars: repos.iter().map(|r| r.stars).fold(0, u64::saturating_add),
            total_forks: repos.iter().map(|r| r.forks).fold(0, u64::saturating_add),
            languages,
            most_starred,
            recently_updated,
        }
    }

    pub fn language_count(&self) -> usize {
        self.languages.len()
    }
}
