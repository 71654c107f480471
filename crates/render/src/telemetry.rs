use crate::layer::RenderLayer;
use std::collections::HashMap;
use std::time::Duration;

/// Per-frame render counters for the telemetry collaborator.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub entities_rendered: usize,
    pub entities_culled: usize,
    pub commands_flushed: usize,
    pub layer_vertices: HashMap<RenderLayer, usize>,
    pub frame_time: Duration,
}

/// Read-only per-frame telemetry, gated by an enable flag.
///
/// When disabled every record call is a no-op and `stats` stays at its
/// defaults, so instrumentation can stay in place in hot paths.
#[derive(Debug)]
pub struct Telemetry {
    enabled: bool,
    current: FrameStats,
    timer: FrameTimer,
}

impl Telemetry {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: FrameStats::default(),
            timer: FrameTimer::new(120),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reset the per-frame counters. Call at the top of each frame.
    pub fn begin_frame(&mut self) {
        if !self.enabled {
            return;
        }
        self.current.entities_rendered = 0;
        self.current.entities_culled = 0;
        self.current.commands_flushed = 0;
        self.current.layer_vertices.clear();
        self.current.frame_time = Duration::ZERO;
    }

    /// Record the frame's wall time and fold it into the rolling window.
    pub fn end_frame(&mut self, frame_time: Duration) {
        if !self.enabled {
            return;
        }
        self.current.frame_time = frame_time;
        self.timer.record(frame_time);
    }

    pub fn record_rendered(&mut self) {
        if self.enabled {
            self.current.entities_rendered += 1;
        }
    }

    pub fn record_culled(&mut self) {
        if self.enabled {
            self.current.entities_culled += 1;
        }
    }

    pub fn record_flushed(&mut self, count: usize) {
        if self.enabled {
            self.current.commands_flushed += count;
        }
    }

    pub fn record_layer_vertices(&mut self, layer: RenderLayer, count: usize) {
        if self.enabled {
            *self.current.layer_vertices.entry(layer).or_default() += count;
        }
    }

    /// Counters for the frame in progress (or the last finished frame).
    pub fn stats(&self) -> &FrameStats {
        &self.current
    }

    /// Rolling average frame time over the window.
    pub fn average_frame_time(&self) -> Duration {
        self.timer.average()
    }

    /// Worst frame time in the window.
    pub fn max_frame_time(&self) -> Duration {
        self.timer.max()
    }
}

/// Fixed-capacity ring of recent frame times.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    /// A ring of at least one slot; a zero capacity is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }

    pub fn average(&self) -> Duration {
        let count = self.count();
        if count == 0 {
            return Duration::ZERO;
        }
        let total: Duration = self.history[..count].iter().sum();
        total / count as u32
    }

    pub fn max(&self) -> Duration {
        self.history[..self.count()]
            .iter()
            .copied()
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{ShaderRef, TextureRef};

    fn layer() -> RenderLayer {
        RenderLayer::solid(TextureRef(1), ShaderRef(1))
    }

    #[test]
    fn disabled_telemetry_records_nothing() {
        let mut telemetry = Telemetry::new(false);
        telemetry.begin_frame();
        telemetry.record_rendered();
        telemetry.record_culled();
        telemetry.record_layer_vertices(layer(), 30);
        telemetry.end_frame(Duration::from_millis(16));

        assert_eq!(telemetry.stats().entities_rendered, 0);
        assert_eq!(telemetry.stats().entities_culled, 0);
        assert!(telemetry.stats().layer_vertices.is_empty());
        assert_eq!(telemetry.average_frame_time(), Duration::ZERO);
    }

    #[test]
    fn counters_accumulate_within_a_frame() {
        let mut telemetry = Telemetry::new(true);
        telemetry.begin_frame();
        telemetry.record_rendered();
        telemetry.record_rendered();
        telemetry.record_culled();
        telemetry.record_layer_vertices(layer(), 12);
        telemetry.record_layer_vertices(layer(), 6);

        assert_eq!(telemetry.stats().entities_rendered, 2);
        assert_eq!(telemetry.stats().entities_culled, 1);
        assert_eq!(telemetry.stats().layer_vertices[&layer()], 18);
    }

    #[test]
    fn begin_frame_resets_counters() {
        let mut telemetry = Telemetry::new(true);
        telemetry.begin_frame();
        telemetry.record_rendered();
        telemetry.begin_frame();
        assert_eq!(telemetry.stats().entities_rendered, 0);
    }

    #[test]
    fn zero_capacity_timer_clamps_and_records() {
        let mut timer = FrameTimer::new(0);
        timer.record(Duration::from_millis(5));
        assert_eq!(timer.count(), 1);
        assert_eq!(timer.average(), Duration::from_millis(5));
        assert_eq!(timer.max(), Duration::from_millis(5));
    }

    #[test]
    fn frame_timer_averages_and_wraps() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        assert_eq!(timer.average(), Duration::from_millis(15));

        timer.record(Duration::from_millis(30)); // overwrites the first
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
        assert_eq!(timer.max(), Duration::from_millis(30));
    }
}
