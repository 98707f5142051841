// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to GitHub (or a proxy for it).
//
// Currently implements:
// - The Repository / ActivitySnapshot data model and its normalization
// - The HttpSource seam with a reqwest-backed implementation
// - Fetching the catalog through an ordered fallback chain with caching
// =============================================================================

mod client;
mod fetch;
mod model;

pub use client::{HttpReply, HttpSource, ReqwestSource};
pub use fetch::{parse_github_user, CatalogFetcher};
pub use model::{ActivitySnapshot, Repository};
