//! Fixed-timestep driver: converts variable wall-clock deltas into discrete
//! simulation ticks plus a leftover interpolation fraction.
//!
//! # Invariants
//! - `partial_ticks()` is always in `[0, 1)` after `advance` returns.
//! - At most `max_catch_up_ticks` ticks run per `advance` call; whole-tick
//!   excess beyond that is discarded and accounted in `dropped_seconds()`.

mod driver;

pub use driver::{TickConfig, TickDriver};

pub fn crate_info() -> &'static str {
    "cadence-clock v0.1.0"
}
