use cadence_clock::{TickConfig, TickDriver};
use cadence_extract::{SnapshotPool, SnapshotView};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// The world/entity collaborator boundary.
///
/// The implementation owns the live entity collection; nothing outside the
/// simulation thread ever sees it.
pub trait WorldSource: Send + 'static {
    /// Advance authoritative state by one tick. Implementations must record
    /// previous-tick state (`EntityState::begin_tick`) before mutating.
    fn tick(&mut self, tick_index: u64);

    /// Copy render-relevant state for every live entity into the pool,
    /// stamped with the current interpolation fraction.
    fn extract(&mut self, pool: &mut SnapshotPool, partial_ticks: f32);
}

/// Engine configuration, constructor-injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    pub tick: TickConfig,
}

/// Owns the simulation thread and the snapshot double buffer.
///
/// `start` spawns the simulation loop; the render side takes a
/// [`SnapshotView`] via [`Engine::snapshots`] and drives its own frames.
/// `shutdown` (or drop) flips the running flag and joins; the loop exits at
/// the next iteration boundary.
pub struct Engine {
    running: Arc<AtomicBool>,
    sim_thread: Option<JoinHandle<()>>,
    view: SnapshotView,
}

impl Engine {
    pub fn start(config: EngineConfig, source: impl WorldSource) -> Engine {
        let pool = SnapshotPool::new();
        let view = pool.view();
        let running = Arc::new(AtomicBool::new(true));

        let flag = running.clone();
        let sim_thread = std::thread::Builder::new()
            .name("cadence-sim".into())
            .spawn(move || sim_loop(config.tick, source, pool, flag))
            .expect("spawn simulation thread");

        tracing::info!(
            tick_interval = config.tick.tick_interval_seconds,
            "engine started"
        );

        Engine {
            running,
            sim_thread: Some(sim_thread),
            view,
        }
    }

    /// Read handle for the render thread.
    pub fn snapshots(&self) -> SnapshotView {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request cooperative shutdown and wait for the simulation thread.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.sim_thread.take() {
            if handle.join().is_err() {
                tracing::error!("simulation thread panicked");
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sim_loop(
    config: TickConfig,
    mut source: impl WorldSource,
    mut pool: SnapshotPool,
    running: Arc<AtomicBool>,
) {
    let mut driver = TickDriver::new(config);
    let mut last = Instant::now();

    while running.load(Ordering::Relaxed) {
        let now = Instant::now();
        let delta = (now - last).as_secs_f64();
        last = now;

        let ticks = driver.advance(delta, |index| source.tick(index));

        // Refresh the interpolation fraction every iteration, not only on
        // tick boundaries, so motion stays smooth between ticks.
        source.extract(&mut pool, driver.partial_ticks());
        pool.publish();

        if ticks == 0 {
            // Ahead of schedule; yield rather than spin.
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    tracing::debug!(ticks = driver.tick_count(), "simulation loop stopped");
}
