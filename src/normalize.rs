//! Conversions from raw dB-ish telemetry to the bounded scalars the sphere's shaders take.
//!
//! Everything here is total: bad input is clamped or zeroed, never rejected.
use crate::data::AudioSample;

/// A calibration that maps a dB window onto `[min, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProfile {
    /// Level (dB) that maps to 0 before the minimum is applied.
    pub floor_db: f64,
    /// Width of the window (dB) that maps onto 0..1.
    pub span_db: f64,
    /// Lower bound of the output.
    pub min: f64,
}

/// Used for the colour-blend uniforms: the whole -60..20 dB range is visible.
pub const WIDE: LevelProfile = LevelProfile {
    floor_db: -60.0,
    span_db: 80.0,
    min: 0.0,
};

/// Used for wave displacement. The floor keeps waves moving even when the room is quiet.
pub const NARROW: LevelProfile = LevelProfile {
    floor_db: -20.0,
    span_db: 60.0,
    min: 0.4,
};

/// The wave shader's overall activity level.
pub const WAVE_AVERAGE: LevelProfile = LevelProfile {
    floor_db: -20.0,
    span_db: 60.0,
    min: 0.5,
};

impl LevelProfile {
    pub fn apply(&self, raw: f64) -> f64 {
        normalize_level(raw, self.floor_db, self.span_db).max(self.min)
    }
}

/// `clamp((raw - floor_db) / span_db, 0, 1)`, with NaN mapped to 0.
pub fn normalize_level(raw: f64, floor_db: f64, span_db: f64) -> f64 {
    let v = (raw - floor_db) / span_db;
    if v.is_nan() {
        0.0
    } else {
        v.max(0.0).min(1.0)
    }
}

/// `clamp(value / scale, -1, 1)`, with NaN mapped to 0.
pub fn normalize_signed(value: f64, scale: f64) -> f64 {
    let v = value / scale;
    if v.is_nan() {
        0.0
    } else {
        v.max(-1.0).min(1.0)
    }
}

#[inline]
pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

// Demo motion: two sinusoids with their own rate and phase so the channels drift apart and back.
const DEMO_BASE_DB: f64 = -30.0;
const DEMO_LEFT_DEPTH_DB: f64 = 20.0;
const DEMO_LEFT_RATE: f64 = 2.1;
const DEMO_RIGHT_DEPTH_DB: f64 = 18.0;
const DEMO_RIGHT_RATE: f64 = 1.7;
const DEMO_RIGHT_PHASE: f64 = 1.2;

/// Spacing of the placeholder chart series.
pub const PLACEHOLDER_STEP_SECONDS: f64 = 0.5;

/// A sample that is purely a function of `time_seconds`.
pub fn synthesize_demo_sample(time_seconds: f64) -> AudioSample {
    let t = finite_or_zero(time_seconds);
    let left = DEMO_BASE_DB + (t * DEMO_LEFT_RATE).sin() * DEMO_LEFT_DEPTH_DB;
    let right =
        DEMO_BASE_DB + (t * DEMO_RIGHT_RATE + DEMO_RIGHT_PHASE).sin() * DEMO_RIGHT_DEPTH_DB;
    AudioSample::from_levels(left, right, (t * 1000.0) as i64)
}

/// `n` demo samples at fixed offsets from t = 0, for charts that have nothing real to show.
pub fn placeholder_series(n: usize) -> Vec<AudioSample> {
    (0..n)
        .map(|i| synthesize_demo_sample(i as f64 * PLACEHOLDER_STEP_SECONDS))
        .collect()
}
