// src/clock.rs
// =============================================================================
// A tiny time source abstraction.
//
// Cache TTLs, the rate-limit cooldown and the "commits in the last 30 days"
// window all depend on "now". Passing a Clock around lets tests move time
// forward by hand instead of sleeping.
// =============================================================================

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
