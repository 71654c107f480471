use crate::data::{AnimationData, AnimationEvent, LoopMode};
use crate::events::{EventRearmMode, EventTracker};
use crate::sampler::sample_pose;
use crate::snapshot::BoneSnapshot;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Pose differences below this are not worth blending; the incoming pose is
/// used directly.
const NEGLIGIBLE_BLEND: f32 = 1e-4;

#[derive(Debug, Clone)]
struct ActiveClip {
    data: Arc<AnimationData>,
    time: f32,
    events: EventTracker,
}

impl ActiveClip {
    fn new(data: Arc<AnimationData>, rearm: EventRearmMode) -> Self {
        Self {
            data,
            time: 0.0,
            events: EventTracker::new(rearm),
        }
    }
}

/// Playback state for one named animation layer.
///
/// Tracks the current clip and its playback time; during a transition the
/// previous clip keeps advancing while a blend weight ramps up over the
/// incoming clip's `blend_in` (or the outgoing clip's `blend_out`, whichever
/// is longer).
///
/// `play` is idempotent: requesting the clip that is already active on the
/// layer leaves playback time untouched. Without this, callers that issue
/// `play` every frame restart the clip every frame and the pose visibly
/// jitters at frame rate.
#[derive(Debug, Clone, Default)]
pub struct AnimationController {
    current: Option<ActiveClip>,
    outgoing: Option<ActiveClip>,
    transition_elapsed: f32,
    rearm: EventRearmMode,
}

impl AnimationController {
    pub fn new(rearm: EventRearmMode) -> Self {
        Self {
            rearm,
            ..Self::default()
        }
    }

    /// Start (or keep) playing `data` on this layer. A no-op when `data` is
    /// already the active clip. Otherwise the active clip becomes the
    /// outgoing side of a transition and the new clip starts at time zero.
    pub fn play(&mut self, data: Arc<AnimationData>) {
        if let Some(current) = &self.current {
            if current.data.name == data.name {
                return;
            }
        }
        self.outgoing = self.current.take();
        self.transition_elapsed = 0.0;
        self.current = Some(ActiveClip::new(data, self.rearm));
    }

    /// Fade the current clip out toward the rest pose.
    pub fn stop(&mut self) {
        if self.current.is_some() {
            self.outgoing = self.current.take();
            self.transition_elapsed = 0.0;
        }
    }

    /// Advance playback by `dt` seconds. Returns the events the current clip
    /// crossed this step; the outgoing clip of a transition does not fire.
    pub fn advance(&mut self, dt: f32) -> Vec<AnimationEvent> {
        let mut fired = Vec::new();
        if let Some(current) = &mut self.current {
            current.time += dt;
            fired = current.events.advance(&current.data, current.time);
        }
        if let Some(outgoing) = &mut self.outgoing {
            outgoing.time += dt;
            self.transition_elapsed += dt;
            if self.transition_elapsed >= self.blend_duration() {
                self.outgoing = None;
            }
        }
        fired
    }

    /// Blend progress of the running transition in `[0, 1]`; 1 when no
    /// transition is running.
    pub fn blend_weight(&self) -> f32 {
        if self.outgoing.is_none() {
            return 1.0;
        }
        let duration = self.blend_duration();
        if duration <= 0.0 {
            1.0
        } else {
            (self.transition_elapsed / duration).clamp(0.0, 1.0)
        }
    }

    fn blend_duration(&self) -> f32 {
        let fade_in = self
            .current
            .as_ref()
            .map(|c| c.data.blend_in)
            .unwrap_or(0.0);
        let fade_out = self
            .outgoing
            .as_ref()
            .map(|c| c.data.blend_out)
            .unwrap_or(0.0);
        fade_in.max(fade_out)
    }

    /// The blended per-bone pose of this layer. Bones absent from the map
    /// hold their rest pose.
    pub fn sample(&self) -> BTreeMap<String, BoneSnapshot> {
        let weight = self.blend_weight();
        match (&self.outgoing, &self.current) {
            (None, None) => BTreeMap::new(),
            (None, Some(current)) => sample_pose(&current.data, current.time),
            (Some(outgoing), None) => {
                // Stopping: fade every bone toward rest.
                let mut pose = sample_pose(&outgoing.data, outgoing.time);
                for snapshot in pose.values_mut() {
                    *snapshot = snapshot.lerp(&BoneSnapshot::REST, weight);
                }
                pose
            }
            (Some(outgoing), Some(current)) => {
                let from = sample_pose(&outgoing.data, outgoing.time);
                let to = sample_pose(&current.data, current.time);
                let mut blended = BTreeMap::new();
                for bone in from.keys().chain(to.keys()) {
                    if blended.contains_key(bone) {
                        continue;
                    }
                    let a = from.get(bone).copied().unwrap_or(BoneSnapshot::REST);
                    let b = to.get(bone).copied().unwrap_or(BoneSnapshot::REST);
                    let snapshot = if a.distance_to(&b) < NEGLIGIBLE_BLEND {
                        b
                    } else {
                        a.lerp(&b, weight)
                    };
                    blended.insert(bone.clone(), snapshot);
                }
                blended
            }
        }
    }

    /// Name of the clip currently driving this layer.
    pub fn current_animation(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.data.name.as_str())
    }

    /// Playback time of the current clip.
    pub fn playback_time(&self) -> Option<f32> {
        self.current.as_ref().map(|c| c.time)
    }

    /// True when a `Once` clip has reached its end.
    pub fn is_finished(&self) -> bool {
        match &self.current {
            Some(clip) => {
                clip.data.loop_mode == LoopMode::Once && clip.time >= clip.data.duration
            }
            None => self.outgoing.is_none(),
        }
    }
}
