use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// One bone's pose at an instant: rotation (Euler radians), position, scale,
/// and the playback timestamp the pose was sampled at.
///
/// Snapshots are plain values. Blending never mutates its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneSnapshot {
    pub rotation: Vec3,
    pub position: Vec3,
    pub scale: Vec3,
    pub timestamp: f32,
}

impl BoneSnapshot {
    /// The rest pose: no rotation, no offset, unit scale.
    pub const REST: BoneSnapshot = BoneSnapshot {
        rotation: Vec3::ZERO,
        position: Vec3::ZERO,
        scale: Vec3::ONE,
        timestamp: 0.0,
    };

    pub fn new(rotation: Vec3, position: Vec3, scale: Vec3, timestamp: f32) -> Self {
        Self {
            rotation,
            position,
            scale,
            timestamp,
        }
    }

    /// Componentwise linear interpolation, including the timestamp.
    /// Exact at the endpoints: `lerp(a, b, 0) == a` and `lerp(a, b, 1) == b`.
    pub fn lerp(&self, other: &BoneSnapshot, alpha: f32) -> BoneSnapshot {
        BoneSnapshot {
            rotation: self.rotation.lerp(other.rotation, alpha),
            position: self.position.lerp(other.position, alpha),
            scale: self.scale.lerp(other.scale, alpha),
            timestamp: self.timestamp + (other.timestamp - self.timestamp) * alpha,
        }
    }

    /// Like [`BoneSnapshot::lerp`], but the rotation path goes through
    /// quaternion space with a normalized lerp.
    ///
    /// This is an approximation of true spherical interpolation: the sign of
    /// the quaternion dot product picks the short arc, but angular velocity
    /// is not constant for large angle deltas.
    pub fn slerp(&self, other: &BoneSnapshot, alpha: f32) -> BoneSnapshot {
        let qa = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        let qb = Quat::from_euler(
            EulerRot::XYZ,
            other.rotation.x,
            other.rotation.y,
            other.rotation.z,
        );
        let qb = if qa.dot(qb) < 0.0 { -qb } else { qb };
        let blended = (qa * (1.0 - alpha) + qb * alpha).normalize();
        let (rx, ry, rz) = blended.to_euler(EulerRot::XYZ);

        BoneSnapshot {
            rotation: Vec3::new(rx, ry, rz),
            position: self.position.lerp(other.position, alpha),
            scale: self.scale.lerp(other.scale, alpha),
            timestamp: self.timestamp + (other.timestamp - self.timestamp) * alpha,
        }
    }

    /// Layer `other` on top of this pose. Rotation and position add
    /// `other * weight`; scale adds `(other - 1) * weight` so that the
    /// multiplicative identity is preserved at weight 0.
    pub fn blend_additive(&self, other: &BoneSnapshot, weight: f32) -> BoneSnapshot {
        BoneSnapshot {
            rotation: self.rotation + other.rotation * weight,
            position: self.position + other.position * weight,
            scale: self.scale + (other.scale - Vec3::ONE) * weight,
            timestamp: self.timestamp,
        }
    }

    /// Weighted Euclidean distance between two poses. Rotation differences
    /// weigh double, scale differences half; used to skip negligible blends.
    pub fn distance_to(&self, other: &BoneSnapshot) -> f32 {
        let dr = other.rotation - self.rotation;
        let dp = other.position - self.position;
        let ds = other.scale - self.scale;
        (dr.length_squared() * 2.0 + dp.length_squared() + ds.length_squared() * 0.5).sqrt()
    }

    /// Componentwise comparison within `epsilon`. The timestamp is not part
    /// of pose equivalence.
    pub fn is_equivalent_to(&self, other: &BoneSnapshot, epsilon: f32) -> bool {
        let close = |a: Vec3, b: Vec3| (a - b).abs().max_element() <= epsilon;
        close(self.rotation, other.rotation)
            && close(self.position, other.position)
            && close(self.scale, other.scale)
    }
}

impl Default for BoneSnapshot {
    fn default() -> Self {
        Self::REST
    }
}
