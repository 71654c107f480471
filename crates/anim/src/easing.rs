use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// The closed catalogue of easing curves.
///
/// Each curve is a deterministic pure function `[0, 1] -> R` with
/// `f(0) = 0` and `f(1) = 1`. The back/elastic/bounce families deliberately
/// over- or undershoot outside `[0, 1]` mid-range.
///
/// Dispatch goes through a flat `const` function table indexed by the enum
/// discriminant, keeping sampling allocation-free and branch-predictable.
/// The variant order and [`TABLE`] order must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum Easing {
    Linear,
    SineIn,
    SineOut,
    SineInOut,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    CircIn,
    CircOut,
    CircInOut,
    BackIn,
    BackOut,
    BackInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

const TABLE: [fn(f32) -> f32; 31] = [
    linear,
    sine_in,
    sine_out,
    sine_in_out,
    quad_in,
    quad_out,
    quad_in_out,
    cubic_in,
    cubic_out,
    cubic_in_out,
    quart_in,
    quart_out,
    quart_in_out,
    quint_in,
    quint_out,
    quint_in_out,
    expo_in,
    expo_out,
    expo_in_out,
    circ_in,
    circ_out,
    circ_in_out,
    back_in,
    back_out,
    back_in_out,
    elastic_in,
    elastic_out,
    elastic_in_out,
    bounce_in,
    bounce_out,
    bounce_in_out,
];

impl Easing {
    /// Every catalogue entry, in table order.
    pub const ALL: [Easing; 31] = [
        Easing::Linear,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::QuartIn,
        Easing::QuartOut,
        Easing::QuartInOut,
        Easing::QuintIn,
        Easing::QuintOut,
        Easing::QuintInOut,
        Easing::ExpoIn,
        Easing::ExpoOut,
        Easing::ExpoInOut,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CircInOut,
        Easing::BackIn,
        Easing::BackOut,
        Easing::BackInOut,
        Easing::ElasticIn,
        Easing::ElasticOut,
        Easing::ElasticInOut,
        Easing::BounceIn,
        Easing::BounceOut,
        Easing::BounceInOut,
    ];

    /// Remap normalized time `t` through this curve.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        TABLE[self as usize](t)
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Linear
    }
}

fn linear(t: f32) -> f32 {
    t
}

fn sine_in(t: f32) -> f32 {
    1.0 - (t * PI / 2.0).cos()
}

fn sine_out(t: f32) -> f32 {
    (t * PI / 2.0).sin()
}

fn sine_in_out(t: f32) -> f32 {
    -((PI * t).cos() - 1.0) / 2.0
}

fn quad_in(t: f32) -> f32 {
    t * t
}

fn quad_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

fn quad_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

fn cubic_in(t: f32) -> f32 {
    t * t * t
}

fn cubic_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

fn cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn quart_in(t: f32) -> f32 {
    t.powi(4)
}

fn quart_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(4)
}

fn quart_in_out(t: f32) -> f32 {
    if t < 0.5 {
        8.0 * t.powi(4)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
    }
}

fn quint_in(t: f32) -> f32 {
    t.powi(5)
}

fn quint_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(5)
}

fn quint_in_out(t: f32) -> f32 {
    if t < 0.5 {
        16.0 * t.powi(5)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
    }
}

fn expo_in(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else {
        2f32.powf(10.0 * t - 10.0)
    }
}

fn expo_out(t: f32) -> f32 {
    if t == 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

fn expo_in_out(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else if t < 0.5 {
        2f32.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
    }
}

fn circ_in(t: f32) -> f32 {
    1.0 - (1.0 - t * t).sqrt()
}

fn circ_out(t: f32) -> f32 {
    (1.0 - (t - 1.0) * (t - 1.0)).sqrt()
}

fn circ_in_out(t: f32) -> f32 {
    if t < 0.5 {
        (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
    }
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;

fn back_in(t: f32) -> f32 {
    BACK_C3 * t * t * t - BACK_C1 * t * t
}

fn back_out(t: f32) -> f32 {
    1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
}

fn back_in_out(t: f32) -> f32 {
    if t < 0.5 {
        ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
    } else {
        ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
    }
}

const ELASTIC_C4: f32 = 2.0 * PI / 3.0;
const ELASTIC_C5: f32 = 2.0 * PI / 4.5;

fn elastic_in(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
    }
}

fn elastic_out(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
    }
}

fn elastic_in_out(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else if t < 0.5 {
        -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
    } else {
        2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin() / 2.0 + 1.0
    }
}

fn bounce_in(t: f32) -> f32 {
    1.0 - bounce_out(1.0 - t)
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

fn bounce_in_out(t: f32) -> f32 {
    if t < 0.5 {
        (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
    } else {
        (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_curve_anchors_at_zero_and_one() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            let end = easing.apply(1.0);
            assert!((end - 1.0).abs() < 1e-5, "{easing:?} at 1 gave {end}");
        }
    }

    #[test]
    fn table_order_matches_variants() {
        // Spot-check that the discriminant indexing hits the right function.
        assert_eq!(Easing::Linear.apply(0.3), 0.3);
        assert_eq!(Easing::QuadIn.apply(0.5), 0.25);
        assert_eq!(Easing::CubicIn.apply(0.5), 0.125);
        assert!((Easing::QuintIn.apply(0.5) - 0.03125).abs() < 1e-6);
        assert!((Easing::BounceOut.apply(0.2) - 7.5625 * 0.04).abs() < 1e-6);
    }

    #[test]
    fn out_variants_mirror_in_variants() {
        for (ein, eout) in [
            (Easing::QuadIn, Easing::QuadOut),
            (Easing::CubicIn, Easing::CubicOut),
            (Easing::SineIn, Easing::SineOut),
            (Easing::CircIn, Easing::CircOut),
        ] {
            for t in [0.1, 0.25, 0.5, 0.75, 0.9] {
                let mirrored = 1.0 - ein.apply(1.0 - t);
                assert!(
                    (eout.apply(t) - mirrored).abs() < 1e-5,
                    "{eout:?} at {t} not mirror of {ein:?}"
                );
            }
        }
    }

    #[test]
    fn back_in_undershoots() {
        assert!(Easing::BackIn.apply(0.2) < 0.0);
    }

    #[test]
    fn elastic_out_overshoots() {
        let mut overshot = false;
        for i in 1..100 {
            if Easing::ElasticOut.apply(i as f32 / 100.0) > 1.0 {
                overshot = true;
            }
        }
        assert!(overshot);
    }

    #[test]
    fn in_out_variants_hit_half_at_half() {
        for easing in [
            Easing::SineInOut,
            Easing::QuadInOut,
            Easing::CubicInOut,
            Easing::QuartInOut,
            Easing::QuintInOut,
            Easing::ExpoInOut,
            Easing::CircInOut,
            Easing::BounceInOut,
        ] {
            let mid = easing.apply(0.5);
            assert!((mid - 0.5).abs() < 1e-5, "{easing:?} at 0.5 gave {mid}");
        }
    }
}
