// src/rank/order.rs
// =============================================================================
// Deterministic ordering of repositories.
//
// Order of comparison:
// 1. Featured repositories first, in the configured order
// 2. The selected sort key
// 3. updated_at, newest first
// 4. catalog_index, lowest first
//
// The last step makes every comparison total, so the same input always
// gives the same output no matter how the sort is implemented.
// =============================================================================

use std::cmp::Ordering;

use clap::ValueEnum;
use serde::Serialize;

use crate::github::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Popularity score (stars, forks, activity, showcase score)
    #[default]
    Popular,
    /// Showcase readiness score
    Showcase,
    /// Most recent activity first
    Recent,
    /// Stargazer count
    Stars,
    /// Alphabetical by name
    Name,
}

pub fn sort_repos(repos: &mut [Repository], key: SortKey, featured: &[String]) {
    repos.sort_by(|a, b| compare(a, b, key, featured));
}

fn compare(a: &Repository, b: &Repository, key: SortKey, featured: &[String]) -> Ordering {
    featured_rank(a, featured)
        .cmp(&featured_rank(b, featured))
        .then_with(|| by_key(a, b, key))
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| a.catalog_index.cmp(&b.catalog_index))
}

fn by_key(a: &Repository, b: &Repository, key: SortKey) -> Ordering {
    match key {
        SortKey::Popular => b.popularity_score.total_cmp(&a.popularity_score),
        SortKey::Showcase => b.showcase_score.total_cmp(&a.showcase_score),
        SortKey::Recent => b.last_activity_at().cmp(&a.last_activity_at()),
        SortKey::Stars => b.stars.cmp(&a.stars),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}

// Position in the featured list; everything else sorts after it
fn featured_rank(repo: &Repository, featured: &[String]) -> usize {
    featured
        .iter()
        .position(|name| name.eq_ignore_ascii_case(&repo.name) || name.eq_ignore_ascii_case(&repo.full_name))
        .unwrap_or(usize::MAX)
}
