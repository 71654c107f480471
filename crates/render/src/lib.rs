//! Render-side core: hierarchical pose stack, double-buffered render command
//! queue, per-layer geometry batching, renderer registry, and frame telemetry.
//!
//! # Invariants
//! - Render commands are value copies; they never hold references into
//!   simulation-owned state.
//! - The execution list is never mutated once swapped; flushing holds no
//!   lock.
//! - Commands execute in submission order within a batch; batch N fully
//!   precedes batch N+1.
//!
//! The GPU submission backend is external; [`CommandSink`] is its boundary.

mod command;
mod layer;
mod pose;
mod registry;
mod telemetry;

pub use command::{command_queue, CommandSink, RenderCommand, RenderQueue, RenderQueueConsumer};
pub use layer::{GeometryBuffer, LayerBatches, ModelRef, OverlayTag, RenderLayer, ShaderRef, TextureRef};
pub use pose::PoseStack;
pub use registry::{EntityRenderer, RenderContext, RendererRegistry};
pub use telemetry::{FrameStats, FrameTimer, Telemetry};

/// Errors from render-side operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no renderer registered for type key {0:?}")]
    UnknownTypeKey(String),
    #[error("model {0:?} could not be resolved")]
    MissingModel(ModelRef),
    #[error("geometry buffer already building")]
    BufferAlreadyBuilding,
    #[error("geometry buffer not building")]
    BufferNotBuilding,
}

pub fn crate_info() -> &'static str {
    "cadence-render v0.1.0"
}
