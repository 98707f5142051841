// src/github/client.rs
// =============================================================================
// The HTTP seam between the engine and its collaborators.
//
// The fetcher and the hydrator never talk to reqwest directly. They go
// through the HttpSource trait, which returns the three things they care
// about: the status code, the pagination Link header and the body text.
// Tests plug in a fake source; the CLI plugs in ReqwestSource.
//
// Rust concepts:
// - Traits with async methods (via the async-trait crate)
// - Arc<dyn Trait>: shared ownership of a trait object across tasks
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK, USER_AGENT};
use reqwest::Client;

use crate::error::FetchError;

/// What a collaborator answered. Non-2xx statuses are still replies.
#[derive(Debug, Clone, Default)]
pub struct HttpReply {
    pub status: u16,
    /// Raw value of the `Link` pagination header, if present
    pub link: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Issues one GET. Transport failures are errors; any HTTP status is a reply.
    async fn get(&self, url: &str) -> Result<HttpReply, FetchError>;
}

/// HttpSource backed by a pooled reqwest client.
pub struct ReqwestSource {
    client: Client,
}

impl ReqwestSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        // Every call gets a hard timeout so a hung collaborator cannot stall
        // a whole render cycle
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get(&self, url: &str) -> Result<HttpReply, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("repo-showcase/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(categorize_error)?;

        Ok(HttpReply { status, link, body })
    }
}

// Maps reqwest failures onto the engine's error taxonomy
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connect(error.to_string())
    } else if error.is_decode() {
        FetchError::Malformed(error.to_string())
    } else {
        FetchError::Transport(error.to_string())
    }
}
