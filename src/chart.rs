//! The chart refresh contract: which series to rasterize and the numeric layout of each point.
//!
//! Heights and strengths are fractions of the chart area; turning them into pixels, colours and
//! strokes is the renderer's business.
use crate::{
    data::AudioSample,
    direction::Direction,
    mode::VisualizationMode,
};
use itertools::{Itertools, MinMaxResult};

/// Spread (dB) at which a stereo trace reaches the edge of the chart.
const STEREO_FULL_SCALE_DB: f64 = 25.0;
/// Differences above this get a connector between the two traces.
const STEREO_CONNECTOR_DB: f64 = 3.0;
/// Average level (dB) below which a stereo point is drawn at minimum intensity.
const STEREO_INTENSITY_FLOOR_DB: f64 = 50.0;
/// Width of the average-level window (dB) over which intensity ramps up to full.
const STEREO_INTENSITY_SPAN_DB: f64 = 30.0;
const STEREO_MIN_INTENSITY: f64 = 0.1;
const ACTIVITY_MIN_LEVEL: f64 = 0.1;
const ACTIVITY_BASE_SCALE: f64 = 0.7;
const ACTIVITY_BOOST_DB: f64 = 20.0;
const ACTIVITY_MAX_HEIGHT: f64 = 0.9;
const ACTIVITY_STRONG_DB: f64 = 8.0;
const ACTIVITY_WEAK_DB: f64 = 3.0;

/// Where a chart series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrigin {
    Replay,
    Live,
    /// Synthesized because nothing real has been observed.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub mode: VisualizationMode,
    pub origin: SeriesOrigin,
    pub series: Vec<AudioSample>,
}

impl ChartRequest {
    pub fn layout(&self) -> ChartLayout {
        match self.mode {
            VisualizationMode::ChartActivity => ChartLayout::Activity(activity_layout(&self.series)),
            _ => ChartLayout::Stereo(stereo_layout(&self.series)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartLayout {
    Stereo(Vec<StereoPoint>),
    Activity(Vec<ActivityBar>),
}

/// One column of the directional (stereo) chart. Left traces go up from the centre line, right
/// traces go down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoPoint {
    /// 0..1 distance of the left trace from the centre line.
    pub left_strength: f64,
    /// 0..1 distance of the right trace from the centre line.
    pub right_strength: f64,
    /// 0.1..1, from the average level.
    pub intensity: f64,
    /// True once the spread crosses the direction threshold; drawn with a heavier stroke.
    pub emphasised: bool,
    pub connector: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarTone {
    StrongLeft,
    Left,
    Neutral,
    Right,
    StrongRight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityBar {
    /// 0..0.9 of the chart height.
    pub height: f64,
    pub tone: BarTone,
}

pub fn stereo_layout(series: &[AudioSample]) -> Vec<StereoPoint> {
    series
        .iter()
        .map(|s| {
            let d = s.difference;
            let strength = (d.abs() / STEREO_FULL_SCALE_DB).min(1.0);
            let (left_strength, right_strength) = if d > 0.0 {
                (strength, 0.0)
            } else if d < 0.0 {
                (0.0, strength)
            } else {
                (0.0, 0.0)
            };
            let intensity =
                (s.average_level - STEREO_INTENSITY_FLOOR_DB) / STEREO_INTENSITY_SPAN_DB;
            StereoPoint {
                left_strength,
                right_strength,
                intensity: intensity.max(STEREO_MIN_INTENSITY).min(1.0),
                emphasised: Direction::from_difference(d) != Direction::Center,
                connector: d.abs() > STEREO_CONNECTOR_DB,
            }
        })
        .collect()
}

pub fn activity_layout(series: &[AudioSample]) -> Vec<ActivityBar> {
    let (min, max) = match series.iter().map(|s| s.average_level).minmax_by(f64_cmp) {
        MinMaxResult::NoElements => return vec![],
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let range = max - min;
    series
        .iter()
        .map(|s| {
            let level = if range > 0.0 {
                ((s.average_level - min) / range).max(ACTIVITY_MIN_LEVEL).min(1.0)
            } else {
                // flat series: every bar at full level
                1.0
            };
            let boost = 1.0 + s.difference.abs() / ACTIVITY_BOOST_DB;
            ActivityBar {
                height: (level * ACTIVITY_BASE_SCALE * boost).min(ACTIVITY_MAX_HEIGHT),
                tone: tone(s.difference),
            }
        })
        .collect()
}

fn tone(d: f64) -> BarTone {
    if d > ACTIVITY_STRONG_DB {
        BarTone::StrongLeft
    } else if d > ACTIVITY_WEAK_DB {
        BarTone::Left
    } else if d < -ACTIVITY_STRONG_DB {
        BarTone::StrongRight
    } else if d < -ACTIVITY_WEAK_DB {
        BarTone::Right
    } else {
        BarTone::Neutral
    }
}

fn f64_cmp(a: &f64, b: &f64) -> std::cmp::Ordering {
    a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
}
