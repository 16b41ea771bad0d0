//! Turns stereo level readings from a room sensor into the per-frame state of the meeting-room
//! sphere: which source is authoritative, where the sound is coming from, and what the renderer
//! should be fed for the active visualization.
pub mod chart;
pub mod cli;
pub mod data;
pub mod direction;
pub mod fixture;
pub mod insights;
pub mod mode;
pub mod monitor_data;
pub mod normalize;
pub mod replay;
pub mod scene;
pub mod source;

use room_telemetry::Reading;
use std::{fmt, time::Duration};

use crate::{
    chart::{ChartRequest, SeriesOrigin},
    cli::Config,
    data::{AudioSample, DataSourceMode},
    direction::{classify, Direction, DirectionState},
    insights::{Insights, SpatialAnalysis, SpatialIndicator, SphereEffects},
    mode::{RenderContract, ShaderUniforms, Transition, VisualizationMode},
    normalize::placeholder_series,
    replay::{ReplayScheduler, ReplayState},
    scene::Scene,
    source::{Arbiter, Clock, LiveLink},
};

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

/// The numeric readout shown next to the sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub left_db: f64,
    pub right_db: f64,
    pub difference_db: f64,
    pub direction: Direction,
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "L {:.1} dB | R {:.1} dB | diff {:+.1} dB | {}",
            self.left_db, self.right_db, self.difference_db, self.direction
        )
    }
}

/// Everything the rendering layer needs for one animation tick. All of it is derived from a
/// single sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub source: DataSourceMode,
    pub sample: AudioSample,
    pub readout: Readout,
    pub direction: DirectionState,
    /// Levels normalized with the profile of the active mode.
    pub normalized_left: f64,
    pub normalized_right: f64,
    pub active_mode: VisualizationMode,
    /// Set while a shader mode is active.
    pub uniforms: Option<ShaderUniforms>,
    /// Set when a chart mode needs re-rasterizing this tick.
    pub chart: Option<ChartRequest>,
    /// Occupancy colour, only while the sphere runs on demo motion.
    pub base_color: Option<u32>,
    pub effects: SphereEffects,
    /// Arrows for the sides that have dominated recently.
    pub spatial_indicators: Vec<SpatialIndicator>,
    pub replay: ReplayState,
}

/// Owns the arbiter, the replay scheduler, the mode machine, the insights and the scene, and
/// produces one [`Frame`] per tick.
pub struct Visualizer {
    arbiter: Arbiter,
    replay: ReplayScheduler,
    modes: mode::ModeMachine,
    insights: Insights,
    scene: Scene,
    fixture: Vec<AudioSample>,
    placeholder_points: usize,
    chart_refresh: Duration,
    since_chart: Duration,
    chart_due: bool,
}

impl Visualizer {
    pub fn new(config: &Config, link: impl LiveLink + 'static, clock: impl Clock + 'static) -> Self {
        Visualizer {
            arbiter: Arbiter::new(link, clock, config.live_history),
            replay: ReplayScheduler::new(config.replay_tick()),
            modes: mode::ModeMachine::new(),
            insights: Insights::new(config.insights_history),
            scene: Scene::new(),
            fixture: fixture::meeting(),
            placeholder_points: config.placeholder_points,
            chart_refresh: config.chart_refresh(),
            since_chart: Duration::from_millis(0),
            chart_due: false,
        }
    }

    /// Use a different recording for replay. Takes effect the next time replay starts.
    pub fn set_fixture(&mut self, fixture: Vec<AudioSample>) {
        self.fixture = fixture;
    }

    /// Handle a raw line from the sensor board. Returns whether it carried levels.
    pub fn on_live_message(&mut self, raw: &str) -> Result<bool> {
        let reading = Reading::parse(raw)?;
        if !reading.is_audio() {
            log::trace!("ignoring non-audio frame: {}", raw);
            return Ok(false);
        }
        self.on_live_reading(&reading);
        Ok(true)
    }

    pub fn on_live_reading(&mut self, reading: &Reading) {
        self.arbiter.on_live_reading(reading);
    }

    pub fn on_live_sample(&mut self, sample: AudioSample) {
        self.arbiter.on_live_sample(sample);
    }

    /// Handle a raw frame from the insights server. Returns whether it carried predictions.
    pub fn on_insights_message(&mut self, raw: &str) -> Result<bool> {
        self.insights.on_message(raw)
    }

    pub fn start_replay(&mut self) -> bool {
        let started = self.replay.start(self.fixture.clone(), &mut self.arbiter);
        if started {
            self.chart_due = true;
        }
        started
    }

    pub fn stop_replay(&mut self) {
        self.replay.stop(&mut self.arbiter);
        self.chart_due = true;
    }

    /// Returns whether replay is now playing.
    pub fn toggle_replay(&mut self) -> bool {
        if self.replay.is_playing() {
            self.stop_replay();
            false
        } else {
            self.start_replay()
        }
    }

    pub fn select_mode(&mut self, mode: VisualizationMode) -> Option<Transition> {
        let transition = self.modes.select(mode);
        self.on_transition(transition);
        transition
    }

    pub fn select_mode_named(&mut self, name: &str) -> Option<Transition> {
        let transition = self.modes.select_named(name);
        self.on_transition(transition);
        transition
    }

    fn on_transition(&mut self, transition: Option<Transition>) {
        if let Some(Transition {
            contract: RenderContract::PullChart,
            ..
        }) = transition
        {
            self.chart_due = true;
            self.since_chart = Duration::from_millis(0);
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn insights(&self) -> &Insights {
        &self.insights
    }

    pub fn active_mode(&self) -> VisualizationMode {
        self.modes.active()
    }

    pub fn source(&self) -> DataSourceMode {
        self.arbiter.active_mode()
    }

    pub fn replay_state(&self) -> ReplayState {
        self.replay.state()
    }

    /// The insights server's spatial breakdown if it sent one, otherwise one computed from the
    /// recent live samples.
    pub fn spatial(&self) -> SpatialAnalysis {
        self.insights.spatial().unwrap_or_else(|| {
            let recent: Vec<AudioSample> = self.arbiter.live_history().copied().collect();
            SpatialAnalysis::from_samples(&recent)
        })
    }

    /// Advance by `dt` and produce the frame to render.
    pub fn frame(&mut self, dt: Duration) -> Frame {
        let fired = self.replay.advance(dt, &mut self.arbiter);
        // one query per frame: everything below uses this sample
        let current = self.arbiter.current();
        let sample = current.sample;
        let authoritative = current.mode.is_authoritative();
        let direction = classify(&sample, authoritative);
        let (normalized_left, normalized_right) = self.modes.normalized_levels(&sample);

        let chart = if self.modes.contract() == RenderContract::PullChart {
            self.since_chart += dt;
            if self.chart_due || fired > 0 || self.since_chart >= self.chart_refresh {
                self.chart_due = false;
                self.since_chart = Duration::from_millis(0);
                Some(self.chart_request(current.mode))
            } else {
                None
            }
        } else {
            None
        };

        Frame {
            source: current.mode,
            sample,
            readout: Readout {
                left_db: sample.left_level,
                right_db: sample.right_level,
                difference_db: sample.difference,
                direction: direction.classification,
            },
            direction,
            normalized_left,
            normalized_right,
            active_mode: self.modes.active(),
            uniforms: self.modes.uniforms(&sample, &direction, authoritative),
            chart,
            base_color: match current.mode {
                DataSourceMode::Demo => Some(self.scene.occupancy_color()),
                _ => None,
            },
            effects: self.insights.effects(),
            spatial_indicators: self.spatial().indicators(),
            replay: self.replay.state(),
        }
    }

    fn chart_request(&self, source: DataSourceMode) -> ChartRequest {
        let (origin, series) = if self.replay.is_playing() {
            (SeriesOrigin::Replay, self.replay.fixture().to_vec())
        } else if source == DataSourceMode::Live && self.arbiter.has_live_history() {
            (
                SeriesOrigin::Live,
                self.arbiter.live_history().copied().collect(),
            )
        } else {
            (
                SeriesOrigin::Placeholder,
                placeholder_series(self.placeholder_points),
            )
        };
        log::debug!("chart refresh: {} {:?} points", series.len(), origin);
        ChartRequest {
            mode: self.modes.active(),
            origin,
            series,
        }
    }
}
