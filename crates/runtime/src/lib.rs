//! Engine runtime: wires the fixed-timestep driver, snapshot extraction, and
//! the render-side frame pass together across two threads.
//!
//! # Invariants
//! - Live entities are touched only on the simulation thread; the render
//!   side sees pooled snapshots and value-copied commands exclusively.
//! - The simulation thread never blocks on the render thread.
//! - Shutdown is cooperative: the running flag is checked once per loop
//!   iteration and in-flight ticks always complete.

mod engine;
mod frame;

pub use engine::{Engine, EngineConfig, WorldSource};
pub use frame::render_frame;

pub fn crate_info() -> &'static str {
    "cadence-runtime v0.1.0"
}
