// src/testing.rs
// =============================================================================
// Test helpers shared by the unit tests of several modules.
//
// - ManualClock: a clock that only moves when told to
// - FakeSource: an HttpSource answering from canned routes, recording calls,
//   and optionally holding some requests until a gate is opened
// =============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::clock::Clock;
use crate::error::FetchError;
use crate::github::{HttpReply, HttpSource};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn start() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(fixed_now()),
        })
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub fn reply(status: u16, body: &str) -> HttpReply {
    HttpReply {
        status,
        link: None,
        body: body.to_string(),
    }
}

pub fn reply_with_last_page(body: &str, base: &str, last_page: u64) -> HttpReply {
    HttpReply {
        status: 200,
        link: Some(format!(
            "<{base}?per_page=1&page=2>; rel=\"next\", <{base}?per_page=1&page={last_page}>; rel=\"last\""
        )),
        body: body.to_string(),
    }
}

/// A raw upstream-shaped repository record.
pub fn repo_json(name: &str, stars: u64, updated_at: &str) -> Value {
    json!({
        "name": name,
        "full_name": format!("octo/{}", name),
        "owner": {"login": "octo"},
        "description": format!("The {} project", name),
        "language": "Rust",
        "topics": ["cli"],
        "stargazers_count": stars,
        "forks_count": 1,
        "watchers_count": stars,
        "fork": false,
        "archived": false,
        "updated_at": updated_at,
        "pushed_at": updated_at,
    })
}

type Route = (String, Result<HttpReply, FetchError>);

#[derive(Default)]
pub struct FakeSource {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<(String, Arc<Semaphore>)>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answers any URL containing `pattern`. Earlier routes win.
    pub fn on(&self, pattern: &str, reply: HttpReply) {
        self.routes.lock().push((pattern.to_string(), Ok(reply)));
    }

    pub fn fail(&self, pattern: &str, error: FetchError) {
        self.routes.lock().push((pattern.to_string(), Err(error)));
    }

    /// Requests whose URL contains `pattern` wait until the returned
    /// semaphore is given permits.
    pub fn hold(&self, pattern: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some((pattern.to_string(), gate.clone()));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.calls.lock().iter().filter(|url| url.contains(pattern)).count()
    }
}

#[async_trait]
impl HttpSource for FakeSource {
    async fn get(&self, url: &str) -> Result<HttpReply, FetchError> {
        self.calls.lock().push(url.to_string());

        let gate = self
            .gate
            .lock()
            .as_ref()
            .filter(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, gate)| gate.clone());
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        self.routes
            .lock()
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Ok(reply(404, "{\"message\":\"Not Found\"}")))
    }
}
