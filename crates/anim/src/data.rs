use crate::easing::Easing;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What happens when playback time passes the end of the clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Wrap back to the start.
    Loop,
    /// Clamp at the end; the clip is then finished.
    Once,
    /// Clamp at the end and keep holding the last pose.
    HoldLast,
}

/// A timestamped target value for one channel, with the easing applied over
/// the segment that starts here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: Vec3,
    #[serde(default)]
    pub easing: Easing,
}

/// Per-bone keyframe lists. Any channel may be empty, meaning the bone keeps
/// its rest pose on that channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    #[serde(default)]
    pub rotation: Vec<Keyframe>,
    #[serde(default)]
    pub position: Vec<Keyframe>,
    #[serde(default)]
    pub scale: Vec<Keyframe>,
}

impl BoneTrack {
    pub fn is_empty(&self) -> bool {
        self.rotation.is_empty() && self.position.is_empty() && self.scale.is_empty()
    }
}

/// A named trigger fired once per forward crossing of its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationEvent {
    pub timestamp: f32,
    pub kind: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// A complete parsed animation clip, exactly as handed over by the asset
/// collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    pub name: String,
    pub duration: f32,
    pub loop_mode: LoopMode,
    #[serde(default)]
    pub blend_in: f32,
    #[serde(default)]
    pub blend_out: f32,
    #[serde(default)]
    pub bone_tracks: BTreeMap<String, BoneTrack>,
    #[serde(default)]
    pub events: Vec<AnimationEvent>,
}

/// Errors from animation data validation.
#[derive(Debug, thiserror::Error)]
pub enum AnimError {
    #[error("animation {name:?} has non-positive duration {duration}")]
    NonPositiveDuration { name: String, duration: f32 },
    #[error("animation {name:?}, bone {bone:?}, {channel} channel: keyframes not sorted by time")]
    UnsortedKeyframes {
        name: String,
        bone: String,
        channel: &'static str,
    },
    #[error("animation {name:?}: event {kind:?} at {timestamp} outside [0, {duration}]")]
    EventOutOfRange {
        name: String,
        kind: String,
        timestamp: f32,
        duration: f32,
    },
}

impl AnimationData {
    /// The synthetic stand-in substituted for malformed or missing clips:
    /// one second, looping, no tracks, so every bone holds its rest pose.
    pub fn fallback_idle() -> AnimationData {
        AnimationData {
            name: "fallback_idle".into(),
            duration: 1.0,
            loop_mode: LoopMode::Loop,
            blend_in: 0.0,
            blend_out: 0.0,
            bone_tracks: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Check the structural invariants sampling relies on.
    pub fn validate(&self) -> Result<(), AnimError> {
        if self.duration <= 0.0 {
            return Err(AnimError::NonPositiveDuration {
                name: self.name.clone(),
                duration: self.duration,
            });
        }
        for (bone, track) in &self.bone_tracks {
            for (channel, keys) in [
                ("rotation", &track.rotation),
                ("position", &track.position),
                ("scale", &track.scale),
            ] {
                if keys.windows(2).any(|w| w[0].time > w[1].time) {
                    return Err(AnimError::UnsortedKeyframes {
                        name: self.name.clone(),
                        bone: bone.clone(),
                        channel,
                    });
                }
            }
        }
        for event in &self.events {
            if event.timestamp < 0.0 || event.timestamp > self.duration {
                return Err(AnimError::EventOutOfRange {
                    name: self.name.clone(),
                    kind: event.kind.clone(),
                    timestamp: event.timestamp,
                    duration: self.duration,
                });
            }
        }
        Ok(())
    }
}

/// Resolves animation names to clips, substituting the synthetic idle for
/// anything unknown or invalid. The frame loop never fails over assets.
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    animations: BTreeMap<String, Arc<AnimationData>>,
    fallback: Option<Arc<AnimationData>>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip. Invalid clips are rejected with the validation error;
    /// nothing is inserted.
    pub fn register(&mut self, data: AnimationData) -> Result<(), AnimError> {
        data.validate()?;
        self.animations.insert(data.name.clone(), Arc::new(data));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<AnimationData>> {
        self.animations.get(name).cloned()
    }

    /// Resolve `name`, falling back to the synthetic idle when unknown.
    pub fn get_or_fallback(&mut self, name: &str) -> Arc<AnimationData> {
        if let Some(data) = self.animations.get(name) {
            return data.clone();
        }
        tracing::warn!(animation = name, "unknown animation, substituting idle");
        self.fallback
            .get_or_insert_with(|| Arc::new(AnimationData::fallback_idle()))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}
