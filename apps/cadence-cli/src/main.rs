use std::collections::BTreeMap;
use std::sync::Arc;

use cadence_anim::{AnimationController, AnimationData, BoneTrack, Easing, Keyframe, LoopMode};
use cadence_clock::{TickConfig, TickDriver};
use cadence_common::{EntityId, EntityState, EntityTransform, TypeKey};
use cadence_extract::{EntitySnapshot, SnapshotPool, SourceEntity};
use cadence_render::{
    command_queue, EntityRenderer, ModelRef, OverlayTag, RenderCommand, RenderContext,
    RenderError, RenderLayer, RendererRegistry, ShaderRef, Telemetry, TextureRef,
};
use cadence_runtime::render_frame;
use clap::{Parser, Subcommand};
use glam::{Quat, Vec3};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cadence-cli", about = "CLI tool for cadence operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Run a headless simulation and report frame statistics
    Simulate {
        /// Number of simulation ticks to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,
        /// Number of entities to spawn
        #[arg(short, long, default_value = "8")]
        entities: u32,
        /// Simulated frame rate driving the tick accumulator
        #[arg(short, long, default_value = "60.0")]
        fps: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("cadence-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", cadence_common::crate_info());
            println!("clock: {}", cadence_clock::crate_info());
            println!("anim: {}", cadence_anim::crate_info());
            println!("extract: {}", cadence_extract::crate_info());
            println!("render: {}", cadence_render::crate_info());
            println!("runtime: {}", cadence_runtime::crate_info());
        }
        Commands::Simulate {
            ticks,
            entities,
            fps,
        } => simulate(ticks, entities, fps)?,
    }

    Ok(())
}

/// A circling creature for the headless demo world.
struct Orbiter {
    id: EntityId,
    uuid: Uuid,
    type_key: TypeKey,
    state: EntityState,
    phase: f32,
}

impl Orbiter {
    fn new(index: u32) -> Self {
        let phase = index as f32 / 4.0;
        Self {
            id: EntityId(index),
            uuid: Uuid::new_v4(),
            type_key: TypeKey::new("creature/orbiter"),
            state: EntityState::at(EntityTransform {
                position: Self::position_at(phase),
                ..EntityTransform::default()
            }),
            phase,
        }
    }

    fn position_at(phase: f32) -> Vec3 {
        Vec3::new(phase.cos() * 5.0, 0.0, phase.sin() * 5.0)
    }

    fn tick(&mut self) {
        self.state.begin_tick();
        self.phase += 0.1;
        self.state.current.position = Self::position_at(self.phase);
        self.state.current.rotation = Quat::from_rotation_y(self.phase);
    }
}

impl SourceEntity for Orbiter {
    fn id(&self) -> EntityId {
        self.id
    }
    fn uuid(&self) -> Uuid {
        self.uuid
    }
    fn type_key(&self) -> &TypeKey {
        &self.type_key
    }
    fn state(&self) -> &EntityState {
        &self.state
    }
}

/// Draws an orbiter with an idle-bob animation on its body bone.
struct OrbiterRenderer {
    controller: AnimationController,
    idle: Arc<AnimationData>,
}

impl OrbiterRenderer {
    fn new(idle: Arc<AnimationData>) -> Self {
        Self {
            controller: AnimationController::default(),
            idle,
        }
    }
}

impl EntityRenderer for OrbiterRenderer {
    fn render(
        &mut self,
        snapshot: &EntitySnapshot,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), RenderError> {
        self.controller.play(self.idle.clone());
        self.controller.advance(1.0 / 60.0);

        let pose = self.controller.sample();
        ctx.pose.push();
        if let Some(body) = pose.get("body") {
            ctx.pose.translate(body.position);
            ctx.pose.rotate(Quat::from_euler(
                glam::EulerRot::XYZ,
                body.rotation.x,
                body.rotation.y,
                body.rotation.z,
            ));
            ctx.pose.scale(body.scale);
        }
        ctx.queue.submit(RenderCommand {
            pose: *ctx.pose.peek(),
            model: ModelRef(snapshot.id.0 as u64),
            layer: RenderLayer::solid(TextureRef(1), ShaderRef(1)),
            overlay: OverlayTag::default(),
        });
        ctx.pose.pop();
        Ok(())
    }
}

fn idle_bob() -> Arc<AnimationData> {
    Arc::new(AnimationData {
        name: "idle_bob".into(),
        duration: 2.0,
        loop_mode: LoopMode::Loop,
        blend_in: 0.2,
        blend_out: 0.2,
        bone_tracks: BTreeMap::from([(
            "body".into(),
            BoneTrack {
                position: vec![
                    Keyframe {
                        time: 0.0,
                        value: Vec3::ZERO,
                        easing: Easing::SineInOut,
                    },
                    Keyframe {
                        time: 1.0,
                        value: Vec3::new(0.0, 0.25, 0.0),
                        easing: Easing::SineInOut,
                    },
                    Keyframe {
                        time: 2.0,
                        value: Vec3::ZERO,
                        easing: Easing::SineInOut,
                    },
                ],
                ..BoneTrack::default()
            },
        )]),
        events: Vec::new(),
    })
}

/// Drive the fixed-timestep loop and the render pass on one thread with a
/// synthetic frame clock, so runs are reproducible.
fn simulate(ticks: u64, entities: u32, fps: f64) -> anyhow::Result<()> {
    anyhow::ensure!(fps > 0.0, "fps must be positive");
    println!("Headless run: ticks={ticks}, entities={entities}, fps={fps}");

    let mut world: Vec<Orbiter> = (0..entities).map(Orbiter::new).collect();
    let mut driver = TickDriver::new(TickConfig::default());
    let mut pool = SnapshotPool::new();
    let view = pool.view();

    let mut registry = RendererRegistry::new();
    let idle = idle_bob();
    registry.register(TypeKey::new("creature/orbiter"), move || {
        Box::new(OrbiterRenderer::new(idle.clone()))
    });

    let (queue, mut consumer) = command_queue();
    let mut telemetry = Telemetry::new(true);
    let frame_delta = 1.0 / fps;

    let mut frames = 0u64;
    let mut total_commands = 0usize;
    while driver.tick_count() < ticks {
        driver.advance(frame_delta, |_| {
            for orbiter in &mut world {
                orbiter.tick();
            }
        });
        pool.extract(world.iter(), driver.partial_ticks());
        pool.publish();

        total_commands += render_frame(
            &view,
            &mut registry,
            &queue,
            &mut consumer,
            &mut |_: &RenderCommand| {},
            &mut telemetry,
        );
        frames += 1;
    }

    println!(
        "Done: ticks={}, frames={frames}, commands={total_commands}",
        driver.tick_count()
    );
    println!(
        "Last frame: rendered={}, culled={}, flushed={}",
        telemetry.stats().entities_rendered,
        telemetry.stats().entities_culled,
        telemetry.stats().commands_flushed
    );
    println!(
        "Frame time: avg={:?}, max={:?}, dropped_sim={:.3}s",
        telemetry.average_frame_time(),
        telemetry.max_frame_time(),
        driver.dropped_seconds()
    );

    Ok(())
}
