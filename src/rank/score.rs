// src/rank/score.rs
// =============================================================================
// Showcase eligibility and scoring.
//
// Showcase score (0-100), three parts:
//   freshness     up to 40, linear decay to 0 over 180 days since the most
//                 recent of updated_at / pushed_at / latest commit
//   traction      stars*2 + forks*3 + watchers, capped at 30
//   completeness  description 8, language 4, 2 per topic (max 3 topics),
//                 homepage 8, license 4
//
// Every part only grows when an input grows, so the total is monotone in
// each signal. The coefficients themselves are tunable.
// =============================================================================

use chrono::{DateTime, Utc};

use crate::github::Repository;

const FRESHNESS_POINTS: f64 = 40.0;
const FRESHNESS_HORIZON_DAYS: f64 = 180.0;
const TRACTION_CAP: f64 = 30.0;
const MAX_SCORED_TOPICS: usize = 3;

/// Whether a repository belongs in the showcase at all.
pub fn is_showcase_eligible(repo: &Repository) -> bool {
    if repo.fork || repo.archived {
        return false;
    }

    // The owner/owner repository is the profile README, not a project
    if !repo.owner.is_empty() && repo.name.eq_ignore_ascii_case(&repo.owner) {
        return false;
    }

    repo.description.is_some()
        || !repo.topics.is_empty()
        || repo.homepage.is_some()
        || repo.stars > 0
        || repo.forks > 0
}

pub fn showcase_score(repo: &Repository, now: DateTime<Utc>) -> f64 {
    let score = freshness(repo, now) + traction(repo) + completeness(repo);
    score.clamp(0.0, 100.0)
}

/// Sort-only score mixing raw counts, activity and the showcase score.
pub fn popularity_score(repo: &Repository, showcase: f64) -> f64 {
    let (commits, contributors) = repo
        .activity
        .as_ref()
        .map(|a| (a.commits_30d.unwrap_or(0), a.contributors.unwrap_or(0)))
        .unwrap_or((0, 0));

    repo.stars as f64 * 3.0
        + repo.forks as f64 * 2.0
        + repo.watchers as f64
        + commits as f64 * 1.5
        + contributors as f64 * 2.0
        + showcase * 0.5
}

/// Recomputes both scores in place. Safe to call any number of times.
pub fn refresh_scores(repos: &mut [Repository], now: DateTime<Utc>) {
    for repo in repos.iter_mut() {
        let showcase = showcase_score(repo, now);
        repo.showcase_score = showcase;
        repo.popularity_score = popularity_score(repo, showcase);
    }
}

fn freshness(repo: &Repository, now: DateTime<Utc>) -> f64 {
    let Some(last) = repo.last_activity_at() else {
        return 0.0;
    };
    let days = ((now - last).num_seconds() as f64 / 86_400.0).max(0.0);
    FRESHNESS_POINTS * (1.0 - days / FRESHNESS_HORIZON_DAYS).max(0.0)
}

fn traction(repo: &Repository) -> f64 {
    let raw = repo.stars as f64 * 2.0 + repo.forks as f64 * 3.0 + repo.watchers as f64;
    raw.min(TRACTION_CAP)
}

fn completeness(repo: &Repository) -> f64 {
    let mut points = 0.0;
    if repo.description.is_some() {
        points += 8.0;
    }
    if repo.language.is_some() {
        points += 4.0;
    }
    points += 2.0 * repo.topics.len().min(MAX_SCORED_TOPICS) as f64;
    if repo.homepage.is_some() {
        points += 8.0;
    }
    if repo.license.is_some() {
        points += 4.0;
    }
    points
}
