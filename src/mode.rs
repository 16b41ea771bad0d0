//! Which visualization the sphere shows, and what the renderer has to refresh for it.
use crate::{
    data::AudioSample,
    direction::{DirectionState, DEMO_NEUTRAL_WEIGHT},
    normalize::{normalize_signed, NARROW, WAVE_AVERAGE, WIDE},
    Result,
};
use anyhow::format_err;
use std::{fmt, str::FromStr};

/// Spread (dB) that drives the wave shader's difference uniform to its extreme.
const WAVE_DIFFERENCE_SCALE_DB: f64 = 8.0;
const WAVE_INTENSITY: f64 = 1.5;
const WAVE_SPEED: f64 = 1.2;

// Swell the wave levels ride on while there is no authoritative data.
const DEMO_WAVE_BASE: f64 = 0.8;
const DEMO_WAVE_DEPTH: f64 = 0.2;
const DEMO_WAVE_LEFT_RATE: f64 = 1.5;
const DEMO_WAVE_RIGHT_RATE: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizationMode {
    AudioShader,
    WaveShader,
    ChartStereo,
    ChartActivity,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 4] = [
        VisualizationMode::AudioShader,
        VisualizationMode::WaveShader,
        VisualizationMode::ChartStereo,
        VisualizationMode::ChartActivity,
    ];

    pub fn contract(self) -> RenderContract {
        match self {
            VisualizationMode::AudioShader | VisualizationMode::WaveShader => {
                RenderContract::PushUniforms
            }
            VisualizationMode::ChartStereo | VisualizationMode::ChartActivity => {
                RenderContract::PullChart
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VisualizationMode::AudioShader => "audio",
            VisualizationMode::WaveShader => "waves",
            VisualizationMode::ChartStereo => "stereo",
            VisualizationMode::ChartActivity => "activity",
        }
    }
}

impl Default for VisualizationMode {
    fn default() -> Self {
        VisualizationMode::AudioShader
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VisualizationMode {
    type Err = anyhow::Error;

    /// Accepts the short names used by the UI buttons as well as the enum names.
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "audio" | "audio_shader" | "audioshader" => VisualizationMode::AudioShader,
            "waves" | "wave" | "wave_shader" | "waveshader" => VisualizationMode::WaveShader,
            "stereo" | "chart_stereo" | "chartstereo" => VisualizationMode::ChartStereo,
            "activity" | "chart_activity" | "chartactivity" => VisualizationMode::ChartActivity,
            o => return Err(format_err!("unrecognised visualization mode: {}", o)),
        })
    }
}

/// How the renderer is driven while a mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContract {
    /// Shader modes: uniforms are pushed every tick.
    PushUniforms,
    /// Chart modes: the chart texture is re-rasterized from the buffered series on request.
    PullChart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: VisualizationMode,
    pub to: VisualizationMode,
    pub contract: RenderContract,
}

/// Shader inputs for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderUniforms {
    Audio {
        left_audio: f64,
        right_audio: f64,
        average_level: f64,
        center_mix: f64,
        left_dominance: f64,
        right_dominance: f64,
        /// -1 right, 0 centre, 1 left.
        audio_direction: f64,
    },
    Wave {
        left_audio: f64,
        right_audio: f64,
        average_level: f64,
        /// Spread scaled to -1..1.
        difference: f64,
        wave_intensity: f64,
        wave_speed: f64,
    },
}

/// Owns the active visualization mode. Holds no audio data itself.
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    active: VisualizationMode,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> VisualizationMode {
        self.active
    }

    pub fn contract(&self) -> RenderContract {
        self.active.contract()
    }

    /// Switch mode. Re-selecting the active mode does nothing and returns `None`.
    pub fn select(&mut self, mode: VisualizationMode) -> Option<Transition> {
        if mode == self.active {
            return None;
        }
        let from = self.active;
        self.active = mode;
        log::info!("visualization mode {} -> {}", from, mode);
        Some(Transition {
            from,
            to: mode,
            contract: mode.contract(),
        })
    }

    /// Switch mode by name. Unknown names are ignored with a warning.
    pub fn select_named(&mut self, name: &str) -> Option<Transition> {
        match name.parse() {
            Ok(mode) => self.select(mode),
            Err(e) => {
                log::warn!("{}, staying in {}", e, self.active);
                None
            }
        }
    }

    /// The uniforms to push this tick, or `None` while a chart mode is active.
    ///
    /// Without authoritative data the sample is demo motion: the wave spread is damped like the
    /// direction weights, and the wave levels swell with the demo clock so they keep moving.
    pub fn uniforms(
        &self,
        sample: &AudioSample,
        direction: &DirectionState,
        is_authoritative_data_present: bool,
    ) -> Option<ShaderUniforms> {
        match self.active {
            VisualizationMode::AudioShader => Some(ShaderUniforms::Audio {
                left_audio: WIDE.apply(sample.left_level),
                right_audio: WIDE.apply(sample.right_level),
                average_level: WIDE.apply(sample.average_level),
                center_mix: direction.center_mix,
                left_dominance: direction.left_dominance,
                right_dominance: direction.right_dominance,
                audio_direction: direction.classification.signum(),
            }),
            VisualizationMode::WaveShader => {
                let mut left_audio = NARROW.apply(sample.left_level);
                let mut right_audio = NARROW.apply(sample.right_level);
                let mut average_level = WAVE_AVERAGE.apply(sample.average_level);
                let mut difference = normalize_signed(sample.difference, WAVE_DIFFERENCE_SCALE_DB);
                if !is_authoritative_data_present {
                    let t = sample.timestamp_ms as f64 / 1000.0;
                    let left_swell =
                        DEMO_WAVE_BASE + (t * DEMO_WAVE_LEFT_RATE).sin() * DEMO_WAVE_DEPTH;
                    let right_swell =
                        DEMO_WAVE_BASE + (t * DEMO_WAVE_RIGHT_RATE).cos() * DEMO_WAVE_DEPTH;
                    left_audio = left_audio.max(left_swell);
                    right_audio = right_audio.max(right_swell);
                    average_level = average_level.max((left_swell + right_swell) * 0.5);
                    difference *= 1.0 - DEMO_NEUTRAL_WEIGHT;
                }
                Some(ShaderUniforms::Wave {
                    left_audio,
                    right_audio,
                    average_level,
                    difference,
                    wave_intensity: WAVE_INTENSITY,
                    wave_speed: WAVE_SPEED,
                })
            }
            VisualizationMode::ChartStereo | VisualizationMode::ChartActivity => None,
        }
    }

    /// Left/right levels normalized with the profile the active mode uses.
    pub fn normalized_levels(&self, sample: &AudioSample) -> (f64, f64) {
        match self.active {
            VisualizationMode::WaveShader => (
                NARROW.apply(sample.left_level),
                NARROW.apply(sample.right_level),
            ),
            _ => (WIDE.apply(sample.left_level), WIDE.apply(sample.right_level)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        direction::{classify, Direction},
        normalize::synthesize_demo_sample,
    };

    #[test]
    fn starts_in_audio_shader() {
        let m = ModeMachine::new();
        assert_eq!(m.active(), VisualizationMode::AudioShader);
        assert_eq!(m.contract(), RenderContract::PushUniforms);
    }

    #[test]
    fn parse_names() {
        for mode in VisualizationMode::ALL.iter() {
            assert_eq!(mode.name().parse::<VisualizationMode>().unwrap(), *mode);
        }
        assert_eq!(
            "CHART_ACTIVITY".parse::<VisualizationMode>().unwrap(),
            VisualizationMode::ChartActivity
        );
        assert!("sparkles".parse::<VisualizationMode>().is_err());
    }

    #[test]
    fn reselect_is_noop() {
        let mut m = ModeMachine::new();
        let t = m.select(VisualizationMode::ChartStereo);
        assert_eq!(
            t,
            Some(Transition {
                from: VisualizationMode::AudioShader,
                to: VisualizationMode::ChartStereo,
                contract: RenderContract::PullChart,
            })
        );
        assert_eq!(m.select(VisualizationMode::ChartStereo), None);
        assert_eq!(m.contract(), RenderContract::PullChart);
    }

    #[test]
    fn unknown_name_keeps_mode() {
        let mut m = ModeMachine::new();
        m.select(VisualizationMode::WaveShader);
        assert_eq!(m.select_named("hologram"), None);
        assert_eq!(m.active(), VisualizationMode::WaveShader);
        assert!(m.select_named(" Activity ").is_some());
        assert_eq!(m.active(), VisualizationMode::ChartActivity);
    }

    #[test]
    fn audio_uniforms() {
        let m = ModeMachine::new();
        let sample = AudioSample::from_levels(20.0, -20.0, 0);
        let dir = classify(&sample, true);
        match m.uniforms(&sample, &dir, true).unwrap() {
            ShaderUniforms::Audio {
                left_audio,
                right_audio,
                average_level,
                audio_direction,
                ..
            } => {
                assert_eq!(left_audio, 1.0);
                assert_eq!(right_audio, 0.5);
                assert_eq!(average_level, 0.75);
                assert_eq!(audio_direction, Direction::Left.signum());
            }
            other => panic!("unexpected uniforms {:?}", other),
        }
    }

    #[test]
    fn wave_uniforms_stay_visible() {
        let mut m = ModeMachine::new();
        m.select(VisualizationMode::WaveShader);
        let sample = AudioSample::from_levels(-50.0, -54.0, 0);
        let dir = classify(&sample, true);
        match m.uniforms(&sample, &dir, true).unwrap() {
            ShaderUniforms::Wave {
                left_audio,
                right_audio,
                average_level,
                difference,
                ..
            } => {
                assert_eq!(left_audio, 0.4);
                assert_eq!(right_audio, 0.4);
                assert_eq!(average_level, 0.5);
                assert_eq!(difference, 0.5);
            }
            other => panic!("unexpected uniforms {:?}", other),
        }
        assert_eq!(m.normalized_levels(&sample), (0.4, 0.4));
    }

    #[test]
    fn chart_modes_have_no_uniforms() {
        let mut m = ModeMachine::new();
        m.select(VisualizationMode::ChartActivity);
        let sample = AudioSample::from_levels(60.0, 60.0, 0);
        assert_eq!(m.uniforms(&sample, &classify(&sample, true), true), None);
    }

    fn wave_parts(uniforms: Option<ShaderUniforms>) -> (f64, f64, f64, f64) {
        match uniforms {
            Some(ShaderUniforms::Wave {
                left_audio,
                right_audio,
                average_level,
                difference,
                ..
            }) => (left_audio, right_audio, average_level, difference),
            other => panic!("expected wave uniforms, got {:?}", other),
        }
    }

    #[test]
    fn demo_waves_are_neutral_but_moving() {
        let mut m = ModeMachine::new();
        m.select(VisualizationMode::WaveShader);
        let frames: Vec<_> = (0..400)
            .map(|i| {
                let sample = synthesize_demo_sample(i as f64 * 0.05);
                wave_parts(m.uniforms(&sample, &classify(&sample, false), false))
            })
            .collect();
        let keep = 1.0 - DEMO_NEUTRAL_WEIGHT + 1e-12;
        assert!(frames.iter().all(|(_, _, _, d)| d.abs() <= keep));
        let span = |f: fn(&(f64, f64, f64, f64)) -> f64| {
            let values: Vec<f64> = frames.iter().map(f).collect();
            values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
                - values.iter().cloned().fold(f64::INFINITY, f64::min)
        };
        assert!(span(|p| p.0) > 0.2);
        assert!(span(|p| p.1) > 0.2);
        assert!(span(|p| p.2) > 0.1);
        for (l, r, a, _) in &frames {
            assert!(*l >= 0.6 && *l <= 1.0);
            assert!(*r >= 0.6 && *r <= 1.0);
            assert!(*a >= 0.6 && *a <= 1.0);
        }
    }

    #[test]
    fn measured_waves_keep_full_spread() {
        let mut m = ModeMachine::new();
        m.select(VisualizationMode::WaveShader);
        let sample = AudioSample::from_levels(-10.0, -30.0, 0);
        let (_, _, _, difference) = wave_parts(m.uniforms(&sample, &classify(&sample, true), true));
        assert_eq!(difference, 1.0);
    }
}
