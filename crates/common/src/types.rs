use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Runtime identifier for an entity. Dense, assigned by the world
/// collaborator, stable for the entity's lifetime but not across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Key naming an entity type, e.g. `"creature/wolf"`. Renderer factories
/// are registered against type keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey(pub String);

impl TypeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spatial transform of an entity: position, rotation, scale, plus the head
/// yaw and pitch in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub head_yaw: f32,
    pub pitch: f32,
}

impl Default for EntityTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            head_yaw: 0.0,
            pitch: 0.0,
        }
    }
}

/// Current plus previous-tick transform of an entity.
///
/// The simulation calls [`EntityState::begin_tick`] once at the top of each
/// tick, before any mutation of `current`. Interpolation between the two
/// transforms is what makes a 20 Hz simulation render smoothly at any frame
/// rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub current: EntityTransform,
    pub previous: EntityTransform,
}

impl EntityState {
    /// Create a state where both transforms start at the given value, so the
    /// first rendered frame does not interpolate from the origin.
    pub fn at(transform: EntityTransform) -> Self {
        Self {
            current: transform,
            previous: transform,
        }
    }

    /// Record the pre-mutation transform. Must be called exactly once per
    /// tick, before the tick mutates `current`.
    pub fn begin_tick(&mut self) {
        self.previous = self.current;
    }

    /// Blend previous toward current by `partial` in `[0, 1)`.
    pub fn interpolate(&self, partial: f32) -> EntityTransform {
        EntityTransform {
            position: self.previous.position.lerp(self.current.position, partial),
            rotation: self.previous.rotation.slerp(self.current.rotation, partial),
            scale: self.previous.scale.lerp(self.current.scale, partial),
            head_yaw: lerp_degrees(self.previous.head_yaw, self.current.head_yaw, partial),
            pitch: lerp_degrees(self.previous.pitch, self.current.pitch, partial),
        }
    }
}

/// Interpolate between two angles in degrees along the shortest arc.
///
/// `lerp_degrees(350.0, 10.0, 0.5)` is `0.0` (mod 360), not `180.0`.
pub fn lerp_degrees(from: f32, to: f32, t: f32) -> f32 {
    let mut delta = (to - from) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    from + delta * t
}
