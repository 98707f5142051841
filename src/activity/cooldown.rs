// src/activity/cooldown.rs
// =============================================================================
// The shared rate-limit cooldown.
//
// One instance is shared by every hydration task. When any task sees a 429
// or 403, it trips the cooldown; until it expires no task may call the
// activity endpoints. The check and the update both happen under one lock,
// and tripping only ever extends the window.
// =============================================================================

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct RateLimitCooldown {
    until: Mutex<Option<DateTime<Utc>>>,
}

impl RateLimitCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(*self.until.lock(), Some(until) if now < until)
    }

    /// Starts (or extends) the cooldown to `now + period`.
    pub fn trip(&self, now: DateTime<Utc>, period: Duration) {
        let candidate = now + period;
        let mut until = self.until.lock();
        if until.map_or(true, |current| candidate > current) {
            *until = Some(candidate);
        }
    }

    pub fn until(&self) -> Option<DateTime<Utc>> {
        *self.until.lock()
    }
}
