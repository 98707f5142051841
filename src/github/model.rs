// src/github/model.rs
// =============================================================================
// The repository data model and the normalization boundary.
//
// Catalog payloads come from several collaborators (local proxies and the
// GitHub API itself) and none of them can be trusted to agree on field names
// or field types. Everything that enters the engine goes through
// Repository::from_value, which either produces a fully-typed Repository or
// a ParseError. Nothing downstream ever sees a half-shaped record.
//
// Rules applied here:
// - numeric signals become finite, non-negative integers (missing = 0)
// - license may be "MIT" or {"spdx_id": "MIT"}; both become License
// - owner comes from owner.login, an owner string, or the full_name prefix
// =============================================================================

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// A normalized license reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub spdx_id: Option<String>,
}

/// Activity metrics attached to a repository by the hydrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    /// Commits on the default branch in the last 30 days
    pub commits_30d: Option<u64>,
    /// Contributors, anonymous ones included
    pub contributors: Option<u64>,
    /// Date of the most recent commit, when the commits call returned one
    pub latest_commit_at: Option<DateTime<Utc>>,
    /// True only when both counts are missing
    pub unavailable: bool,
}

impl ActivitySnapshot {
    pub fn new(
        commits_30d: Option<u64>,
        contributors: Option<u64>,
        latest_commit_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            commits_30d,
            contributors,
            latest_commit_at,
            unavailable: commits_30d.is_none() && contributors.is_none(),
        }
    }

    /// Snapshot used when no metric could be fetched at all.
    pub fn unavailable() -> Self {
        Self::new(None, None, None)
    }
}

/// One repository of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub topics: BTreeSet<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub size_kb: u64,
    pub license: Option<License>,
    pub default_branch: Option<String>,
    pub homepage: Option<String>,
    pub html_url: Option<String>,
    pub fork: bool,
    pub archived: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    /// Position in the catalog after the fetcher's updated_at sort
    #[serde(default)]
    pub catalog_index: usize,

    // Derived annotations. Activity is never persisted with the catalog,
    // it has its own cache.
    #[serde(skip)]
    pub activity: Option<ActivitySnapshot>,
    #[serde(default)]
    pub showcase_score: f64,
    #[serde(default)]
    pub popularity_score: f64,
}

impl Repository {
    /// Converts one untrusted JSON record into a Repository.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let obj = value.as_object().ok_or(ParseError::NotAnObject)?;

        let full_name_field = text(field(obj, &["full_name", "fullName"]));
        let name = text(field(obj, &["name"]))
            .or_else(|| {
                full_name_field
                    .as_deref()
                    .and_then(|full| full.rsplit('/').next())
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
            })
            .ok_or(ParseError::MissingName)?;

        let owner = match field(obj, &["owner"]) {
            Some(Value::Object(owner)) => text(owner.get("login")),
            other => text(other),
        }
        .or_else(|| {
            full_name_field
                .as_deref()
                .and_then(|full| full.split_once('/'))
                .map(|(owner, _)| owner.to_string())
        })
        .unwrap_or_default();

        let full_name = full_name_field.unwrap_or_else(|| {
            if owner.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", owner, name)
            }
        });

        let topics = match field(obj, &["topics"]) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| text(Some(item)))
                .map(|topic| topic.to_lowercase())
                .collect(),
            _ => BTreeSet::new(),
        };

        Ok(Self {
            full_name,
            name,
            owner,
            description: text(field(obj, &["description"])),
            language: text(field(obj, &["language"])),
            topics,
            stars: coerce_count(field(obj, &["stargazers_count", "stars"])),
            forks: coerce_count(field(obj, &["forks_count", "forks"])),
            watchers: coerce_count(field(obj, &["watchers_count", "watchers"])),
            open_issues: coerce_count(field(obj, &["open_issues_count", "open_issues", "openIssues"])),
            size_kb: coerce_count(field(obj, &["size", "size_kb", "sizeKb"])),
            license: license(field(obj, &["license"])),
            default_branch: text(field(obj, &["default_branch", "defaultBranch"])),
            homepage: text(field(obj, &["homepage"])),
            html_url: text(field(obj, &["html_url", "htmlUrl", "url"])),
            fork: flag(field(obj, &["fork"])),
            archived: flag(field(obj, &["archived"])),
            created_at: timestamp(field(obj, &["created_at", "createdAt"])),
            updated_at: timestamp(field(obj, &["updated_at", "updatedAt"])),
            pushed_at: timestamp(field(obj, &["pushed_at", "pushedAt"])),
            catalog_index: 0,
            activity: None,
            showcase_score: 0.0,
            popularity_score: 0.0,
        })
    }

    /// The most recent of updated_at, pushed_at and the latest known commit.
    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        let latest_commit = self.activity.as_ref().and_then(|a| a.latest_commit_at);
        [self.updated_at, self.pushed_at, latest_commit]
            .into_iter()
            .flatten()
            .max()
    }
}

// First present, non-null value among several field aliases
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Coerces any JSON value to a finite non-negative integer, defaulting to 0.
pub fn coerce_count(value: Option<&Value>) -> u64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        // `as` saturates, so huge values clamp to u64::MAX
        Some(n) if n.is_finite() && n > 0.0 => n.floor() as u64,
        _ => 0,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        _ => false,
    }
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = text(value)?;
    DateTime::parse_from_rfc3339(&raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn license(value: Option<&Value>) -> Option<License> {
    match value {
        Some(Value::String(code)) if !code.trim().is_empty() => Some(License {
            spdx_id: Some(code.trim().to_string()),
        }),
        Some(Value::Object(obj)) => Some(License {
            spdx_id: text(field(obj, &["spdx_id", "spdxId", "key"])),
        }),
        _ => None,
    }
}
