use crate::data::{AnimationData, BoneTrack, Keyframe, LoopMode};
use crate::snapshot::BoneSnapshot;
use glam::Vec3;
use std::collections::BTreeMap;

/// Resolve raw playback time to an effective time inside the clip.
///
/// `Loop` wraps with a Euclidean remainder so negative times land in range;
/// `Once` and `HoldLast` clamp to `[0, duration]`.
pub fn effective_time(time: f32, duration: f32, mode: LoopMode) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    match mode {
        LoopMode::Loop => time.rem_euclid(duration),
        LoopMode::Once | LoopMode::HoldLast => time.clamp(0.0, duration),
    }
}

/// Sample one channel at effective time `t`. Returns `None` for an absent
/// (empty) channel. Before the first keyframe the first value holds; at or
/// after the last, the last value holds.
fn sample_channel(keys: &[Keyframe], t: f32) -> Option<Vec3> {
    let first = keys.first()?;
    if t <= first.time {
        return Some(first.value);
    }
    let last = keys.last()?;
    if t >= last.time {
        return Some(last.value);
    }

    // Bracketing pair: prev.time <= t < next.time.
    let next_index = keys.partition_point(|k| k.time <= t);
    let prev = &keys[next_index - 1];
    let next = &keys[next_index];

    let span = next.time - prev.time;
    if span <= 0.0 {
        return Some(next.value);
    }
    let alpha = prev.easing.apply((t - prev.time) / span);
    Some(prev.value.lerp(next.value, alpha))
}

/// Sample one bone's track at effective time `t`. Channels the track omits
/// fall back to `rest`.
pub fn sample_bone(track: &BoneTrack, t: f32, rest: &BoneSnapshot) -> BoneSnapshot {
    BoneSnapshot {
        rotation: sample_channel(&track.rotation, t).unwrap_or(rest.rotation),
        position: sample_channel(&track.position, t).unwrap_or(rest.position),
        scale: sample_channel(&track.scale, t).unwrap_or(rest.scale),
        timestamp: t,
    }
}

/// Sample every bone of a clip at raw playback `time`, applying the clip's
/// loop mode. Bones without tracks simply do not appear in the map; the
/// caller treats absence as the rest pose.
pub fn sample_pose(data: &AnimationData, time: f32) -> BTreeMap<String, BoneSnapshot> {
    let t = effective_time(time, data.duration, data.loop_mode);
    data.bone_tracks
        .iter()
        .map(|(bone, track)| (bone.clone(), sample_bone(track, t, &BoneSnapshot::REST)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    fn key(time: f32, x: f32, y: f32, z: f32, easing: Easing) -> Keyframe {
        Keyframe {
            time,
            value: Vec3::new(x, y, z),
            easing,
        }
    }

    #[test]
    fn loop_wraps_effective_time() {
        assert!((effective_time(2.5, 2.0, LoopMode::Loop) - 0.5).abs() < 1e-6);
        assert!((effective_time(4.0, 2.0, LoopMode::Loop) - 0.0).abs() < 1e-6);
        assert!((effective_time(-0.5, 2.0, LoopMode::Loop) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn once_and_hold_clamp_effective_time() {
        assert_eq!(effective_time(2.5, 2.0, LoopMode::Once), 2.0);
        assert_eq!(effective_time(2.5, 2.0, LoopMode::HoldLast), 2.0);
        assert_eq!(effective_time(-1.0, 2.0, LoopMode::Once), 0.0);
    }

    #[test]
    fn zero_duration_pins_time_to_zero() {
        assert_eq!(effective_time(3.0, 0.0, LoopMode::Loop), 0.0);
    }

    #[test]
    fn linear_rotation_track_midpoint() {
        // 0 -> 180 degrees about Y over one second, sampled halfway.
        let track = BoneTrack {
            rotation: vec![
                key(0.0, 0.0, 0.0, 0.0, Easing::Linear),
                key(1.0, 0.0, 180.0, 0.0, Easing::Linear),
            ],
            ..BoneTrack::default()
        };
        let pose = sample_bone(&track, 0.5, &BoneSnapshot::REST);
        assert!((pose.rotation.y - 90.0).abs() < 1e-4);
        assert_eq!(pose.rotation.x, 0.0);
        assert_eq!(pose.rotation.z, 0.0);
    }

    #[test]
    fn easing_shapes_the_segment() {
        let track = BoneTrack {
            position: vec![
                key(0.0, 0.0, 0.0, 0.0, Easing::QuadIn),
                key(1.0, 1.0, 0.0, 0.0, Easing::Linear),
            ],
            ..BoneTrack::default()
        };
        // QuadIn on the starting keyframe: alpha 0.5 -> 0.25.
        let pose = sample_bone(&track, 0.5, &BoneSnapshot::REST);
        assert!((pose.position.x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn time_outside_keys_holds_boundary_values() {
        let track = BoneTrack {
            position: vec![
                key(0.2, 1.0, 0.0, 0.0, Easing::Linear),
                key(0.8, 2.0, 0.0, 0.0, Easing::Linear),
            ],
            ..BoneTrack::default()
        };
        assert_eq!(
            sample_bone(&track, 0.0, &BoneSnapshot::REST).position.x,
            1.0
        );
        assert_eq!(
            sample_bone(&track, 1.0, &BoneSnapshot::REST).position.x,
            2.0
        );
    }

    #[test]
    fn missing_channels_fall_back_to_rest() {
        let track = BoneTrack {
            rotation: vec![key(0.0, 1.0, 0.0, 0.0, Easing::Linear)],
            ..BoneTrack::default()
        };
        let rest = BoneSnapshot::REST;
        let pose = sample_bone(&track, 0.5, &rest);
        assert_eq!(pose.position, rest.position);
        assert_eq!(pose.scale, rest.scale);
        assert_eq!(pose.rotation.x, 1.0);
    }

    #[test]
    fn sample_pose_applies_loop_mode_and_covers_all_bones() {
        let data = AnimationData {
            name: "spin".into(),
            duration: 2.0,
            loop_mode: LoopMode::Loop,
            blend_in: 0.0,
            blend_out: 0.0,
            bone_tracks: BTreeMap::from([
                (
                    "body".into(),
                    BoneTrack {
                        rotation: vec![
                            key(0.0, 0.0, 0.0, 0.0, Easing::Linear),
                            key(2.0, 0.0, 2.0, 0.0, Easing::Linear),
                        ],
                        ..BoneTrack::default()
                    },
                ),
                ("tail".into(), BoneTrack::default()),
            ]),
            events: Vec::new(),
        };
        // Playback 2.5 wraps to effective 0.5.
        let pose = sample_pose(&data, 2.5);
        assert!((pose["body"].rotation.y - 0.5).abs() < 1e-5);
        assert!((pose["body"].timestamp - 0.5).abs() < 1e-6);
        assert_eq!(pose["tail"], BoneSnapshot {
            timestamp: 0.5,
            ..BoneSnapshot::REST
        });
    }
}
