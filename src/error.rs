// src/error.rs
// =============================================================================
// Error types shared by the engine's modules.
//
// None of these ever reach the person looking at the showcase: the fetcher
// turns them into "try the next source", the hydrator turns them into a
// null metric, and the cache turns them into a miss. They exist so that
// each of those decisions can be logged with a precise reason.
//
// main.rs still uses anyhow::Result for application plumbing.
// =============================================================================

use thiserror::Error;

/// Why a single HTTP request to a collaborator did not produce a usable body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Why a raw repository record was rejected at the normalization boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("repository record is not a JSON object")]
    NotAnObject,

    #[error("repository record has no usable name")]
    MissingName,
}

/// Failures of the durable cache tier.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
