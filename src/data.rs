use serde::{Deserialize, Serialize};
use std::fmt;

/// One reading of the left and right microphone levels (dB), plus the derived spread and mean.
///
/// `difference` is always `left - right`, so a positive value means the left side is louder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSample {
    pub left_level: f64,
    pub right_level: f64,
    pub difference: f64,
    pub average_level: f64,
    #[serde(default)]
    pub timestamp_ms: i64,
}

impl AudioSample {
    /// Build a sample from the two channel levels, deriving the difference and average.
    pub fn from_levels(left_level: f64, right_level: f64, timestamp_ms: i64) -> Self {
        AudioSample {
            left_level,
            right_level,
            difference: left_level - right_level,
            average_level: (left_level + right_level) * 0.5,
            timestamp_ms,
        }
    }

    /// Copy of the sample with every non-finite field replaced by 0.
    pub fn sanitized(self) -> Self {
        use crate::normalize::finite_or_zero;
        AudioSample {
            left_level: finite_or_zero(self.left_level),
            right_level: finite_or_zero(self.right_level),
            difference: finite_or_zero(self.difference),
            average_level: finite_or_zero(self.average_level),
            timestamp_ms: self.timestamp_ms,
        }
    }
}

/// Which generator the current sample comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSourceMode {
    Live,
    Replay,
    Demo,
}

impl DataSourceMode {
    /// Whether the sample reflects real telemetry (live or recorded) rather than synthesized
    /// motion.
    pub fn is_authoritative(self) -> bool {
        !matches!(self, DataSourceMode::Demo)
    }
}

impl fmt::Display for DataSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            DataSourceMode::Live => "live",
            DataSourceMode::Replay => "replay",
            DataSourceMode::Demo => "demo",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_levels_derives_spread_and_mean() {
        let s = AudioSample::from_levels(75.0, 58.0, 10);
        assert_eq!(s.difference, 17.0);
        assert_eq!(s.average_level, 66.5);
        assert_eq!(s.timestamp_ms, 10);
    }

    #[test]
    fn sanitized_zeroes_bad_fields() {
        let s = AudioSample {
            left_level: f64::NAN,
            right_level: 60.0,
            difference: f64::INFINITY,
            average_level: 30.0,
            timestamp_ms: 0,
        }
        .sanitized();
        assert_eq!(s.left_level, 0.0);
        assert_eq!(s.right_level, 60.0);
        assert_eq!(s.difference, 0.0);
        assert_eq!(s.average_level, 30.0);
    }

    #[test]
    fn only_demo_is_not_authoritative() {
        assert!(DataSourceMode::Live.is_authoritative());
        assert!(DataSourceMode::Replay.is_authoritative());
        assert!(!DataSourceMode::Demo.is_authoritative());
    }
}
