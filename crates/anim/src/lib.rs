//! Animation blending engine: immutable bone-pose snapshots, keyframe
//! sampling, an easing catalogue, and layered playback with transitions.
//!
//! # Invariants
//! - Sampling is pure: same animation, same time, same pose.
//! - Every easing curve satisfies `f(0) = 0` and `f(1) = 1`.
//! - `AnimationController::play` never resets playback time of the
//!   animation that is already active on the layer.
//!
//! This crate does not parse on-disk formats. The asset collaborator hands
//! over [`AnimationData`] already parsed; `serde` derives define the exact
//! structure required.

mod controller;
mod data;
mod easing;
mod events;
mod sampler;
mod snapshot;

pub use controller::AnimationController;
pub use data::{
    AnimError, AnimationData, AnimationEvent, AnimationLibrary, BoneTrack, Keyframe, LoopMode,
};
pub use easing::Easing;
pub use events::{EventRearmMode, EventTracker};
pub use sampler::{effective_time, sample_bone, sample_pose};
pub use snapshot::BoneSnapshot;

pub fn crate_info() -> &'static str {
    "cadence-anim v0.1.0"
}
