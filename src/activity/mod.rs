// src/activity/mod.rs
// =============================================================================
// Repository activity: commit and contributor counts.
//
// Submodules:
// - pagination: derives counts from Link headers
// - cooldown: the shared rate-limit pause
// - hydrate: the Hydrator that ties them to the activity cache
// =============================================================================

mod cooldown;
mod hydrate;
mod pagination;

pub use cooldown::RateLimitCooldown;
pub use hydrate::Hydrator;
