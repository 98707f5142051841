// src/search/mod.rs
// =============================================================================
// Search over the repository catalog.
// =============================================================================

mod fuzzy;

pub use fuzzy::matches;
