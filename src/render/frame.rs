// src/render/frame.rs
// =============================================================================
// What gets painted, and who paints it.
//
// A Frame is one complete state of the showcase view:
// - Loading: the catalog is being fetched for the first time
// - Empty:   nothing eligible matches the current query
// - Cards:   the visible slice, before or after activity arrived
//
// The Painter trait is the boundary to the display. The CLI ships two
// painters: TerminalPainter (table or JSON on stdout) and FrameLog (keeps
// every frame in memory, used by `list` and by tests).
// =============================================================================

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::format::{compact_number, relative_time, truncate, DESCRIPTION_LIMIT};
use super::token::RenderToken;
use crate::github::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Painted straight away with whatever data was at hand
    Initial,
    /// Repainted after the visible slice was hydrated
    Hydrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    Pending,
    Unavailable,
    Available,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub full_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub stars: u64,
    pub forks: u64,
    pub activity: ActivityState,
    pub commits_30d: Option<u64>,
    pub contributors: Option<u64>,
    pub showcase_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl Card {
    pub fn from_repo(repo: &Repository, now: DateTime<Utc>) -> Self {
        let (activity, commits_30d, contributors) = match &repo.activity {
            None => (ActivityState::Pending, None, None),
            Some(a) if a.unavailable => (ActivityState::Unavailable, None, None),
            Some(a) => (ActivityState::Available, a.commits_30d, a.contributors),
        };

        Self {
            full_name: repo.full_name.clone(),
            name: repo.name.clone(),
            description: repo
                .description
                .as_deref()
                .map(|d| truncate(d, DESCRIPTION_LIMIT)),
            language: repo.language.clone(),
            topics: repo.topics.iter().take(3).cloned().collect(),
            stars: repo.stars,
            forks: repo.forks,
            activity,
            commits_30d,
            contributors,
            showcase_score: repo.showcase_score.round() as u32,
            updated: repo.updated_at.map(|at| relative_time(at, now)),
            homepage: repo.homepage.clone(),
            html_url: repo.html_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Frame {
    Loading,
    Empty {
        query: String,
    },
    Cards {
        token: RenderToken,
        phase: Phase,
        cards: Vec<Card>,
    },
}

impl Frame {
    pub fn cards(token: RenderToken, phase: Phase, repos: &[Repository], now: DateTime<Utc>) -> Self {
        Frame::Cards {
            token,
            phase,
            cards: repos.iter().map(|r| Card::from_repo(r, now)).collect(),
        }
    }
}

pub trait Painter: Send + Sync {
    fn paint(&self, frame: &Frame);
}

/// Writes each frame to stdout, as a table or as JSON.
pub struct TerminalPainter {
    json: bool,
}

impl TerminalPainter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl Painter for TerminalPainter {
    fn paint(&self, frame: &Frame) {
        print_frame(frame, self.json);
    }
}

/// Keeps every painted frame.
#[derive(Default)]
pub struct FrameLog {
    frames: Mutex<Vec<Frame>>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn last(&self) -> Option<Frame> {
        self.frames.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }
}

impl Painter for FrameLog {
    fn paint(&self, frame: &Frame) {
        self.frames.lock().push(frame.clone());
    }
}

// Prints a frame either as a table or JSON
pub fn print_frame(frame: &Frame, json: bool) {
    if json {
        match serde_json::to_string_pretty(frame) {
            Ok(output) => println!("{}", output),
            Err(e) => tracing::error!(error = %e, "could not serialize frame"),
        }
        return;
    }

    match frame {
        Frame::Loading => println!("⏳ Loading repositories..."),
        Frame::Empty { query } if query.trim().is_empty() => {
            println!("📭 No showcase-ready repositories found")
        }
        Frame::Empty { query } => println!("📭 No repositories match \"{}\"", query.trim()),
        Frame::Cards { cards, phase, .. } => print_table(cards, *phase),
    }
}

// Prints cards as a human-readable table in the terminal
fn print_table(cards: &[Card], phase: Phase) {
    println!(
        "{:<40} {:<12} {:>7} {:>6} {:>9} {:>7} {:>6}  {:<16}",
        "REPOSITORY", "LANGUAGE", "STARS", "FORKS", "COMMITS", "PEOPLE", "SCORE", "UPDATED"
    );
    println!("{}", "=".repeat(112));

    for card in cards {
        // Truncate name if too long for display
        let name_display = truncate(&card.full_name, 37);

        let (commits, people) = match card.activity {
            ActivityState::Pending => ("…".to_string(), "…".to_string()),
            ActivityState::Unavailable => ("n/a".to_string(), "n/a".to_string()),
            ActivityState::Available => (
                card.commits_30d.map(compact_number).unwrap_or_else(|| "n/a".to_string()),
                card.contributors.map(compact_number).unwrap_or_else(|| "n/a".to_string()),
            ),
        };

        println!(
            "{:<40} {:<12} {:>7} {:>6} {:>9} {:>7} {:>6}  {:<16}",
            name_display,
            card.language.as_deref().unwrap_or("-"),
            compact_number(card.stars),
            compact_number(card.forks),
            commits,
            people,
            card.showcase_score,
            card.updated.as_deref().unwrap_or("-"),
        );

        if let Some(description) = &card.description {
            println!("    {}", description);
        }
    }

    println!();
    if phase == Phase::Initial {
        println!("📊 {} repositories (activity loading)", cards.len());
    } else {
        println!("📊 {} repositories", cards.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::ActivitySnapshot;
    use crate::testing::{fixed_now, repo_json};

    fn repo() -> Repository {
        Repository::from_value(&repo_json("tool", 1500, "2025-05-29T12:00:00Z")).unwrap()
    }

    #[test]
    fn test_card_activity_states() {
        let mut repo = repo();
        assert_eq!(Card::from_repo(&repo, fixed_now()).activity, ActivityState::Pending);

        repo.activity = Some(ActivitySnapshot::unavailable());
        assert_eq!(Card::from_repo(&repo, fixed_now()).activity, ActivityState::Unavailable);

        repo.activity = Some(ActivitySnapshot::new(Some(4), None, None));
        let card = Card::from_repo(&repo, fixed_now());
        assert_eq!(card.activity, ActivityState::Available);
        assert_eq!(card.commits_30d, Some(4));
        assert_eq!(card.updated.as_deref(), Some("3 days ago"));
    }

    #[test]
    fn test_frame_json_shape() {
        let tokens = super::super::token::RenderTokens::new();
        let frame = Frame::cards(tokens.mint(), Phase::Hydrated, &[repo()], fixed_now());
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["state"], "cards");
        assert_eq!(value["phase"], "hydrated");
        assert_eq!(value["token"], 1);
        assert_eq!(value["cards"][0]["full_name"], "octo/tool");

        let empty = serde_json::to_value(Frame::Empty { query: "x".into() }).unwrap();
        assert_eq!(empty["state"], "empty");
    }

    #[test]
    fn test_frame_log_records_in_order() {
        let log = FrameLog::new();
        log.paint(&Frame::Loading);
        log.paint(&Frame::Empty { query: String::new() });

        assert_eq!(log.len(), 2);
        assert_eq!(log.last(), Some(Frame::Empty { query: String::new() }));
    }
}
