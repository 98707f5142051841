// src/render/token.rs
// =============================================================================
// Render tokens: the cooperative cancellation scheme.
//
// Every render cycle mints a new token. Asynchronous work started by a cycle
// remembers its token; when the work finishes it compares against the
// current token and throws its result away if a newer cycle has started.
// Nothing is ever aborted, late results are simply ignored.
// =============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RenderToken(u64);

impl fmt::Display for RenderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct RenderTokens {
    current: AtomicU64,
}

impl RenderTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new cycle. Tokens strictly increase.
    pub fn mint(&self) -> RenderToken {
        RenderToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> RenderToken {
        RenderToken(self.current.load(Ordering::SeqCst))
    }

    /// False once any newer cycle has been minted.
    pub fn is_current(&self, token: RenderToken) -> bool {
        self.current() == token
    }
}
