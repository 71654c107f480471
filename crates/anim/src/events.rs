use crate::data::{AnimationData, AnimationEvent, LoopMode};

/// What happens to an already-fired event when a looping clip wraps.
///
/// The observed behavior differed between runtimes, so it is an explicit
/// configuration rather than an inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventRearmMode {
    /// Re-arm on every loop cycle: the event fires once per cycle.
    #[default]
    EachCycle,
    /// Fire at most once for the whole playback, wraps included.
    OncePerPlayback,
}

/// Tracks playback time across `advance` calls and reports which events were
/// crossed in the forward direction.
///
/// Backward seeks never fire events; they only move the cursor.
#[derive(Debug, Clone)]
pub struct EventTracker {
    mode: EventRearmMode,
    last_time: f32,
    started: bool,
    fired: Vec<bool>,
}

impl EventTracker {
    pub fn new(mode: EventRearmMode) -> Self {
        Self {
            mode,
            last_time: 0.0,
            started: false,
            fired: Vec::new(),
        }
    }

    /// Forget all playback history, as when a clip restarts.
    pub fn reset(&mut self) {
        self.last_time = 0.0;
        self.started = false;
        self.fired.clear();
    }

    /// Move the cursor to `new_time` (raw playback seconds) and return the
    /// events crossed since the previous position, in timeline order per
    /// wrap. The very first call treats its starting position as crossed, so
    /// a `timestamp: 0` event fires when playback begins at zero.
    pub fn advance(&mut self, data: &AnimationData, new_time: f32) -> Vec<AnimationEvent> {
        self.fired.resize(data.events.len(), false);
        let old = self.last_time;
        let first = !self.started;
        self.started = true;
        self.last_time = new_time;

        if new_time < old || data.events.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        match data.loop_mode {
            LoopMode::Once | LoopMode::HoldLast => {
                let lo = old.clamp(0.0, data.duration);
                let hi = new_time.clamp(0.0, data.duration);
                for (i, event) in data.events.iter().enumerate() {
                    if self.fired[i] {
                        continue;
                    }
                    let above_lo = event.timestamp > lo || (first && event.timestamp >= lo);
                    if above_lo && event.timestamp <= hi {
                        self.fired[i] = true;
                        out.push(event.clone());
                    }
                }
            }
            LoopMode::Loop => {
                if data.duration <= 0.0 {
                    return out;
                }
                for (i, event) in data.events.iter().enumerate() {
                    let n = occurrences(event.timestamp, data.duration, old, new_time, first);
                    if n == 0 {
                        continue;
                    }
                    match self.mode {
                        EventRearmMode::EachCycle => {
                            for _ in 0..n {
                                out.push(event.clone());
                            }
                        }
                        EventRearmMode::OncePerPlayback => {
                            if !self.fired[i] {
                                self.fired[i] = true;
                                out.push(event.clone());
                            }
                        }
                    }
                }
            }
        }
        out
    }

    pub fn mode(&self) -> EventRearmMode {
        self.mode
    }
}

impl Default for EventTracker {
    fn default() -> Self {
        Self::new(EventRearmMode::default())
    }
}

/// Count occurrences of the periodic instant `k * period + phase` (k >= 0)
/// inside `(lo, hi]`, or `[lo, hi]` when `inclusive_lo` is set.
fn occurrences(phase: f32, period: f32, lo: f32, hi: f32, inclusive_lo: bool) -> u32 {
    if hi < phase {
        return 0;
    }
    let k_hi = ((hi - phase) / period).floor() as i64;
    let bound = (lo - phase) / period;
    let mut k_lo = if inclusive_lo {
        bound.ceil() as i64
    } else {
        bound.floor() as i64 + 1
    };
    if k_lo < 0 {
        k_lo = 0;
    }
    (k_hi - k_lo + 1).max(0) as u32
}
