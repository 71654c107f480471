use serde::{Deserialize, Serialize};

/// Fixed-timestep configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickConfig {
    /// Duration of one simulation tick in seconds.
    pub tick_interval_seconds: f64,
    /// Maximum number of catch-up ticks executed per `advance` call. Whole
    /// intervals still pending after the cap are dropped, not deferred.
    pub max_catch_up_ticks: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 1.0 / 20.0,
            max_catch_up_ticks: 10,
        }
    }
}

/// Accumulates wall-clock time and runs fixed-duration ticks.
///
/// `advance` runs zero or more ticks and leaves a fractional remainder in
/// the accumulator; `partial_ticks()` exposes that remainder in `[0, 1)` for
/// render interpolation.
///
/// An unbounded catch-up loop spirals under sustained slow ticks (each slow
/// tick grows the backlog it then has to clear), so the loop is capped by
/// `max_catch_up_ticks`. When the cap is hit, the remaining whole intervals
/// are discarded: the simulation falls behind real time rather than freezing
/// the frame loop. Dropped time is tracked and logged.
#[derive(Debug)]
pub struct TickDriver {
    config: TickConfig,
    accumulator: f64,
    tick_count: u64,
    dropped_seconds: f64,
}

impl TickDriver {
    pub fn new(config: TickConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            tick_count: 0,
            dropped_seconds: 0.0,
        }
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Accumulate `delta_seconds` and run up to `max_catch_up_ticks` ticks.
    /// `tick` receives the index of the tick being executed. Returns the
    /// number of ticks executed.
    pub fn advance(&mut self, delta_seconds: f64, mut tick: impl FnMut(u64)) -> u32 {
        let interval = self.config.tick_interval_seconds;
        self.accumulator += delta_seconds.max(0.0);

        let mut executed = 0u32;
        while self.accumulator >= interval && executed < self.config.max_catch_up_ticks {
            tick(self.tick_count);
            self.tick_count += 1;
            self.accumulator -= interval;
            executed += 1;
        }

        if self.accumulator >= interval {
            // Shed one interval at a time, keeping the fractional remainder.
            // A floor of the quotient miscounts on inexact intervals and can
            // leave a whole interval behind.
            let mut dropped = 0.0;
            while self.accumulator >= interval {
                self.accumulator -= interval;
                dropped += interval;
            }
            self.dropped_seconds += dropped;
            tracing::warn!(
                dropped,
                total_dropped = self.dropped_seconds,
                "tick catch-up cap hit, dropping backlog"
            );
        }

        executed
    }

    /// Fractional progress toward the next tick, in `[0, 1)`.
    pub fn partial_ticks(&self) -> f32 {
        // The f64 remainder is strictly below one interval, but the cast can
        // round a near-full remainder up to exactly 1.0.
        let partial = (self.accumulator / self.config.tick_interval_seconds) as f32;
        partial.min(1.0 - f32::EPSILON)
    }

    /// Total ticks executed since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Total simulation time discarded by the catch-up cap, in seconds.
    pub fn dropped_seconds(&self) -> f64 {
        self.dropped_seconds
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new(TickConfig::default())
    }
}
