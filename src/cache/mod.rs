// src/cache/mod.rs
// =============================================================================
// Caching for the showcase engine.
//
// Two independent TieredCache instances are built at startup and shared by
// reference:
// - the catalog cache (whole repository list per user)
// - the activity cache (one ActivitySnapshot per repository)
// They have their own schema versions and TTLs; neither is derived from
// the other.
// =============================================================================

mod durable;
mod tiered;

pub use durable::{DurableStore, FileStore, MemoryStore};
pub use tiered::TieredCache;

/// Bump when the persisted Repository shape changes.
pub const CATALOG_SCHEMA_VERSION: u32 = 3;

/// Bump when the persisted ActivitySnapshot shape changes.
pub const ACTIVITY_SCHEMA_VERSION: u32 = 2;
