//! Typed views of the JSON frames produced by the room sensor board and the insights server.
//!
//! The board sends one object per line, e.g. `{"leftMic": 75.0, "rightMic": 58.0,
//! "difference": 17.0}`. Firmware revisions disagree about which fields are present, and
//! occasionally send strings or nulls where numbers belong, so every numeric field is decoded
//! leniently: anything that isn't a finite number becomes `None` and it's up to the consumer to
//! decide what an absent value means.
use fnv::FnvHashMap as HashMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One telemetry frame from the two-microphone board. Levels are in dB.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub left_mic: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub right_mic: Option<f64>,
    /// `left - right` as computed by the board.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub difference: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_level: Option<f64>,
    /// Board uptime in ms.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub timestamp: Option<i64>,
}

impl Reading {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Frames carrying neither microphone level are status/heartbeat frames, not audio.
    pub fn is_audio(&self) -> bool {
        self.left_mic.is_some() || self.right_mic.is_some()
    }
}

/// Messages pushed by the insights server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    MlPredictions(InsightsMessage),
    Error {
        #[serde(default)]
        message: String,
    },
    /// welcome, stats, pong, ...
    #[serde(other)]
    Other,
}

impl ServerMessage {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct InsightsMessage {
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Keyed by model name (`meeting_type`, `energy_level`, `speaker_count`,
    /// `engagement_score`).
    #[serde(default, deserialize_with = "prediction_table")]
    pub predictions: HashMap<String, Prediction>,
    #[serde(default)]
    pub spatial_analysis: Option<SpatialReport>,
    #[serde(default)]
    pub buffer_size: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub value: Option<PredictionValue>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub probabilities: HashMap<String, f64>,
    /// `classification` or `regression`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    Number(f64),
    Label(String),
}

impl PredictionValue {
    pub fn as_label(&self) -> Option<&str> {
        match self {
            PredictionValue::Label(label) => Some(label),
            PredictionValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PredictionValue::Number(n) => Some(*n),
            PredictionValue::Label(label) => label.trim().parse().ok(),
        }
    }
}

/// The server's own left/right/center breakdown of recent samples.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SpatialReport {
    #[serde(default)]
    pub dominant_side: String,
    #[serde(default)]
    pub left_dominance_pct: f64,
    #[serde(default)]
    pub right_dominance_pct: f64,
    #[serde(default)]
    pub center_pct: f64,
    #[serde(default)]
    pub average_bias: f64,
    #[serde(default)]
    pub spatial_activity: f64,
    #[serde(default)]
    pub speaker_switches: u32,
}

// helpers for deserialize

fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(de)?;
    let num = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(num.filter(|n| n.is_finite()))
}

fn lenient_i64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    Ok(lenient_f64(de)?.map(|n| n as i64))
}

/// A failed model is reported in-band (`{"error": "..."}` either per model or in place of the
/// whole table), so keep whichever entries still look like predictions.
fn prediction_table<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<HashMap<String, Prediction>, D::Error> {
    let raw: HashMap<String, Value> = match Option::deserialize(de)? {
        Some(raw) => raw,
        None => return Ok(HashMap::default()),
    };
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| {
            serde_json::from_value::<Prediction>(value)
                .ok()
                .map(|pred| (name, pred))
        })
        .collect())
}
