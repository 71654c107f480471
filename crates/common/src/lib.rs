//! Shared types for the cadence engine core.
//!
//! # Invariants
//! - `EntityState::previous` is overwritten from `current` exactly once per
//!   tick, before the tick mutates `current`.
//! - All types here are plain values; nothing holds references into live
//!   simulation state.

mod types;

pub use types::{lerp_degrees, EntityId, EntityState, EntityTransform, TypeKey};

pub fn crate_info() -> &'static str {
    "cadence-common v0.1.0"
}
