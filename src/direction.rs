//! Which side of the room the sound is coming from.
use crate::{data::AudioSample, normalize::finite_or_zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A spread smaller than this (dB) reads as centred. The readout label, the shader's direction
/// uniform and the classification all go through [`Direction::from_difference`] so they can't
/// disagree about where this boundary is.
pub const CENTER_THRESHOLD_DB: f64 = 2.0;

/// A 10 dB spread between the channels maps to full dominance of the louder side.
pub const FULL_DOMINANCE_SPREAD_DB: f64 = 10.0;

/// Share of the weights pulled to neutral when the sample is synthesized rather than measured.
pub const DEMO_NEUTRAL_WEIGHT: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Center,
    Right,
}

impl Direction {
    /// `|d| < 2` is centre, the boundary itself belongs to the louder side.
    pub fn from_difference(difference: f64) -> Self {
        let d = finite_or_zero(difference);
        if d >= CENTER_THRESHOLD_DB {
            Direction::Left
        } else if d <= -CENTER_THRESHOLD_DB {
            Direction::Right
        } else {
            Direction::Center
        }
    }

    /// The `audioDirection` shader uniform.
    pub fn signum(self) -> f64 {
        match self {
            Direction::Left => 1.0,
            Direction::Center => 0.0,
            Direction::Right => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Left => "LEFT",
            Direction::Center => "CENTERED",
            Direction::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionState {
    pub classification: Direction,
    pub left_dominance: f64,
    pub right_dominance: f64,
    pub center_mix: f64,
}

impl DirectionState {
    pub fn neutral() -> Self {
        DirectionState {
            classification: Direction::Center,
            left_dominance: 0.0,
            right_dominance: 0.0,
            center_mix: 1.0,
        }
    }
}

/// Derive the direction state of a sample.
///
/// Without authoritative data the sample is demo motion, so the result reads as centred and the
/// weights keep only a small residue of the synthesized spread.
pub fn classify(sample: &AudioSample, is_authoritative_data_present: bool) -> DirectionState {
    let d = finite_or_zero(sample.difference);
    let left_dominance = (d.max(0.0) / FULL_DOMINANCE_SPREAD_DB).min(1.0);
    let right_dominance = ((-d).max(0.0) / FULL_DOMINANCE_SPREAD_DB).min(1.0);
    let center_mix = (1.0 - d.abs() / FULL_DOMINANCE_SPREAD_DB).max(0.0);

    if is_authoritative_data_present {
        DirectionState {
            classification: Direction::from_difference(d),
            left_dominance,
            right_dominance,
            center_mix,
        }
    } else {
        let keep = 1.0 - DEMO_NEUTRAL_WEIGHT;
        DirectionState {
            classification: Direction::Center,
            left_dominance: left_dominance * keep,
            right_dominance: right_dominance * keep,
            center_mix: center_mix * keep + DEMO_NEUTRAL_WEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn with_difference(difference: f64) -> AudioSample {
        AudioSample {
            left_level: 60.0,
            right_level: 60.0 - difference,
            difference,
            average_level: 60.0 - difference / 2.0,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn threshold_boundaries() {
        assert_eq!(Direction::from_difference(2.0), Direction::Left);
        assert_eq!(Direction::from_difference(-2.0), Direction::Right);
        assert_eq!(Direction::from_difference(1.999), Direction::Center);
        assert_eq!(Direction::from_difference(-1.999), Direction::Center);
        assert_eq!(Direction::from_difference(0.0), Direction::Center);
        assert_eq!(Direction::from_difference(f64::NAN), Direction::Center);
    }

    #[test]
    fn dominance_weights() {
        let s = classify(&with_difference(5.0), true);
        assert_eq!(s.classification, Direction::Left);
        assert_eq!(s.left_dominance, 0.5);
        assert_eq!(s.right_dominance, 0.0);
        assert_eq!(s.center_mix, 0.5);

        let s = classify(&with_difference(-25.0), true);
        assert_eq!(s.classification, Direction::Right);
        assert_eq!(s.left_dominance, 0.0);
        assert_eq!(s.right_dominance, 1.0);
        assert_eq!(s.center_mix, 0.0);
    }

    #[test]
    fn demo_data_reads_as_center() {
        let s = classify(&with_difference(20.0), false);
        assert_eq!(s.classification, Direction::Center);
        assert!(s.center_mix >= DEMO_NEUTRAL_WEIGHT);
        // some shimmer survives
        assert!(s.left_dominance > 0.0);
        assert!(s.left_dominance <= 1.0 - DEMO_NEUTRAL_WEIGHT + 1e-12);
        assert_eq!(s.right_dominance, 0.0);
    }

    #[test]
    fn labels_match_signum() {
        for d in &[-12.0, -2.0, -1.0, 0.0, 1.5, 2.0, 9.0] {
            let dir = Direction::from_difference(*d);
            let state = classify(&with_difference(*d), true);
            assert_eq!(state.classification, dir);
            match dir {
                Direction::Left => assert_eq!(dir.signum(), 1.0),
                Direction::Right => assert_eq!(dir.signum(), -1.0),
                Direction::Center => assert_eq!(dir.signum(), 0.0),
            }
        }
    }

    proptest! {
        #[test]
        fn center_band(d in -1.999f64..1.999) {
            prop_assert_eq!(classify(&with_difference(d), true).classification, Direction::Center);
        }

        #[test]
        fn dominance_is_exclusive_and_bounded(d in any::<f64>(), authoritative in any::<bool>()) {
            let s = classify(&with_difference(d), authoritative);
            prop_assert!(s.left_dominance == 0.0 || s.right_dominance == 0.0);
            for w in &[s.left_dominance, s.right_dominance, s.center_mix] {
                prop_assert!(*w >= 0.0 && *w <= 1.0);
            }
        }
    }
}
