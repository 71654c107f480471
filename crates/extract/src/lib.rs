//! Entity snapshot extraction: pooled, double-buffered copies of live entity
//! transforms safe for cross-thread consumption.
//!
//! # Invariants
//! - The presented map is never mutated after publication; readers observe
//!   all of one publish or all of the next, never a mixture.
//! - Snapshots are value copies with no references back into live entities.
//! - The only cross-thread critical section is the O(1) pointer swap inside
//!   `publish`/`latest`.

mod pool;

pub use pool::{EntitySnapshot, SnapshotMap, SnapshotPool, SnapshotView, SourceEntity};

pub fn crate_info() -> &'static str {
    "cadence-extract v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("extract"));
    }
}
