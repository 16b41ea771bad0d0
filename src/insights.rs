//! Meeting insights pushed by the analysis server, and the sphere effects derived from them.
use crate::{
    data::AudioSample,
    direction::Direction,
    Result,
};
use room_telemetry::{InsightsMessage, Prediction, ServerMessage, SpatialReport};
use std::collections::VecDeque;

pub const DEFAULT_HISTORY: usize = 50;

/// Samples considered by [`SpatialAnalysis::from_samples`].
const SPATIAL_WINDOW: usize = 30;
const SPATIAL_MIN_SAMPLES: usize = 5;
/// A sign change only counts as a speaker switch when the new spread is at least this big.
const SWITCH_MIN_DB: f64 = 1.0;
/// A side gets an indicator once it dominates more than this share (%) of the window.
const INDICATOR_MIN_PCT: f64 = 30.0;
const INDICATOR_OFFSET: f64 = 1.2;
const INDICATOR_LEFT_COLOR: u32 = 0xff3333;
const INDICATOR_RIGHT_COLOR: u32 = 0x3333ff;

pub const DEFAULT_ENGAGEMENT: f64 = 50.0;
const DEFAULT_COLOR: u32 = 0x53c566;
const DEFAULT_HUE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingType {
    Discussion,
    Presentation,
    Brainstorm,
    Argument,
}

impl MeetingType {
    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "discussion" => MeetingType::Discussion,
            "presentation" => MeetingType::Presentation,
            "brainstorm" => MeetingType::Brainstorm,
            "argument" => MeetingType::Argument,
            _ => return None,
        })
    }

    /// `0xRRGGBB`
    pub fn color(self) -> u32 {
        match self {
            MeetingType::Discussion => 0x53c566,
            MeetingType::Presentation => 0x3366ff,
            MeetingType::Brainstorm => 0xff8800,
            MeetingType::Argument => 0xff4444,
        }
    }

    pub fn hue(self) -> f64 {
        match self {
            MeetingType::Discussion => 0.3,
            MeetingType::Presentation => 0.67,
            MeetingType::Brainstorm => 0.08,
            MeetingType::Argument => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    High,
    Engaged,
    Moderate,
    Low,
}

impl Engagement {
    /// `score` is 0..100.
    pub fn from_score(score: f64) -> Self {
        if score > 75.0 {
            Engagement::High
        } else if score > 50.0 {
            Engagement::Engaged
        } else if score > 25.0 {
            Engagement::Moderate
        } else {
            Engagement::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Engagement::High => "Highly Engaged",
            Engagement::Engaged => "Engaged",
            Engagement::Moderate => "Moderately Engaged",
            Engagement::Low => "Low Engagement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    /// `confidence` is a 0..1 probability, as the server sends it.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            ConfidenceBand::High
        } else if confidence > 0.6 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Extra shader inputs driven by the insights rather than the audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereEffects {
    pub base_color: u32,
    pub meeting_type_hue: f64,
    pub energy_intensity: f64,
    pub pulse_speed: f64,
    pub engagement_score: f64,
    pub engagement: Engagement,
    /// Confidence of the meeting type prediction, if there was one.
    pub meeting_confidence: Option<ConfidenceBand>,
}

impl SphereEffects {
    pub fn from_message(message: &InsightsMessage) -> Self {
        let label = |name: &str| {
            message
                .predictions
                .get(name)
                .and_then(|p| p.value.as_ref())
                .and_then(|v| v.as_label())
        };
        let meeting = label("meeting_type").and_then(MeetingType::from_label);
        let energy_intensity = match label("energy_level") {
            Some("low") => 0.6,
            Some("high") => 1.4,
            _ => 1.0,
        };
        let engagement_score = message
            .predictions
            .get("engagement_score")
            .and_then(|p| p.value.as_ref())
            .and_then(|v| v.as_number())
            .filter(|n| n.is_finite())
            .unwrap_or(DEFAULT_ENGAGEMENT);

        SphereEffects {
            base_color: meeting.map(MeetingType::color).unwrap_or(DEFAULT_COLOR),
            meeting_type_hue: meeting.map(MeetingType::hue).unwrap_or(DEFAULT_HUE),
            energy_intensity,
            pulse_speed: 1.0 + engagement_score / 100.0 * 2.0,
            engagement_score,
            engagement: Engagement::from_score(engagement_score),
            meeting_confidence: message
                .predictions
                .get("meeting_type")
                .map(|p| ConfidenceBand::from_confidence(p.confidence)),
        }
    }
}

impl Default for SphereEffects {
    fn default() -> Self {
        SphereEffects::from_message(&InsightsMessage::default())
    }
}

/// Left/right/center breakdown of a run of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAnalysis {
    pub dominant_side: Direction,
    pub left_dominance_pct: f64,
    pub right_dominance_pct: f64,
    pub center_pct: f64,
    /// Mean difference (dB).
    pub average_bias: f64,
    /// Standard deviation of the difference (dB).
    pub spatial_activity: f64,
    pub speaker_switches: u32,
}

impl SpatialAnalysis {
    pub fn centered() -> Self {
        SpatialAnalysis {
            dominant_side: Direction::Center,
            left_dominance_pct: 0.0,
            right_dominance_pct: 0.0,
            center_pct: 100.0,
            average_bias: 0.0,
            spatial_activity: 0.0,
            speaker_switches: 0,
        }
    }

    /// Analyse the most recent samples. Fewer than five samples read as fully centred.
    pub fn from_samples(samples: &[AudioSample]) -> Self {
        if samples.len() < SPATIAL_MIN_SAMPLES {
            return Self::centered();
        }
        let recent = &samples[samples.len().saturating_sub(SPATIAL_WINDOW)..];
        let diffs: Vec<f64> = recent.iter().map(|s| s.difference).collect();

        let (mut left, mut right, mut center) = (0usize, 0usize, 0usize);
        for d in &diffs {
            match Direction::from_difference(*d) {
                Direction::Left => left += 1,
                Direction::Right => right += 1,
                Direction::Center => center += 1,
            }
        }
        let dominant_side = if left > right && left > center {
            Direction::Left
        } else if right > left && right > center {
            Direction::Right
        } else {
            Direction::Center
        };

        let n = diffs.len() as f64;
        let mean = diffs.iter().sum::<f64>() / n;
        let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        let speaker_switches = diffs
            .windows(2)
            .filter(|w| sign(w[1]) != sign(w[0]) && w[1].abs() > SWITCH_MIN_DB)
            .count() as u32;

        SpatialAnalysis {
            dominant_side,
            left_dominance_pct: left as f64 * 100.0 / n,
            right_dominance_pct: right as f64 * 100.0 / n,
            center_pct: center as f64 * 100.0 / n,
            average_bias: mean,
            spatial_activity: variance.sqrt(),
            speaker_switches,
        }
    }
}

/// An arrow beside the sphere pointing at a side that has been doing most of the talking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialIndicator {
    pub side: Direction,
    /// Horizontal position relative to the sphere's centre.
    pub offset_x: f64,
    /// 0.5..1, growing with the side's share.
    pub scale: f64,
    /// Pulses per second.
    pub pulse_speed: f64,
    pub color: u32,
}

impl SpatialIndicator {
    fn new(side: Direction, pct: f64) -> Self {
        let (offset_x, color) = match side {
            Direction::Left => (-INDICATOR_OFFSET, INDICATOR_LEFT_COLOR),
            _ => (INDICATOR_OFFSET, INDICATOR_RIGHT_COLOR),
        };
        SpatialIndicator {
            side,
            offset_x,
            scale: 0.5 + pct / 100.0 * 0.5,
            pulse_speed: 2.0 + pct / 50.0,
            color,
        }
    }
}

impl SpatialAnalysis {
    /// Indicators for the sides whose share is over 30%, left first.
    pub fn indicators(&self) -> Vec<SpatialIndicator> {
        [
            (Direction::Left, self.left_dominance_pct),
            (Direction::Right, self.right_dominance_pct),
        ]
        .iter()
        .filter(|(_, pct)| *pct > INDICATOR_MIN_PCT)
        .map(|&(side, pct)| SpatialIndicator::new(side, pct))
        .collect()
    }
}

impl From<&SpatialReport> for SpatialAnalysis {
    fn from(report: &SpatialReport) -> Self {
        SpatialAnalysis {
            dominant_side: match report.dominant_side.as_str() {
                "left" => Direction::Left,
                "right" => Direction::Right,
                _ => Direction::Center,
            },
            left_dominance_pct: report.left_dominance_pct,
            right_dominance_pct: report.right_dominance_pct,
            center_pct: report.center_pct,
            average_bias: report.average_bias,
            spatial_activity: report.spatial_activity,
            speaker_switches: report.speaker_switches,
        }
    }
}

fn sign(d: f64) -> i8 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// The latest insights message plus a short history.
#[derive(Debug, Clone)]
pub struct Insights {
    latest: Option<InsightsMessage>,
    effects: SphereEffects,
    history: VecDeque<InsightsMessage>,
    capacity: usize,
}

impl Insights {
    pub fn new(capacity: usize) -> Self {
        Insights {
            latest: None,
            effects: SphereEffects::default(),
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Handle one raw server frame. Returns whether it carried new predictions.
    pub fn on_message(&mut self, raw: &str) -> Result<bool> {
        match ServerMessage::parse(raw)? {
            ServerMessage::MlPredictions(message) => {
                self.record(message);
                Ok(true)
            }
            ServerMessage::Error { message } => {
                log::warn!("insights server error: {}", message);
                Ok(false)
            }
            ServerMessage::Other => {
                log::debug!("ignoring insights frame: {}", raw);
                Ok(false)
            }
        }
    }

    pub fn record(&mut self, message: InsightsMessage) {
        self.effects = SphereEffects::from_message(&message);
        log::debug!(
            "insights: {} predictions, engagement {:.1} ({})",
            message.predictions.len(),
            self.effects.engagement_score,
            self.effects.engagement.label()
        );
        if self.capacity > 0 {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(message.clone());
        }
        self.latest = Some(message);
    }

    pub fn latest(&self) -> Option<&InsightsMessage> {
        self.latest.as_ref()
    }

    pub fn prediction(&self, name: &str) -> Option<&Prediction> {
        self.latest.as_ref()?.predictions.get(name)
    }

    pub fn effects(&self) -> SphereEffects {
        self.effects
    }

    /// The server's spatial view, if the latest message had one.
    pub fn spatial(&self) -> Option<SpatialAnalysis> {
        self.latest
            .as_ref()?
            .spatial_analysis
            .as_ref()
            .map(SpatialAnalysis::from)
    }

    pub fn history(&self) -> impl Iterator<Item = &InsightsMessage> + '_ {
        self.history.iter()
    }
}

impl Default for Insights {
    fn default() -> Self {
        Insights::new(DEFAULT_HISTORY)
    }
}
