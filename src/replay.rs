//! Looping playback of a recorded meeting at a fixed tick rate.
use crate::{data::AudioSample, source::Arbiter};
use std::time::Duration;

/// Fine-grained enough that the charts look animated.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayState {
    pub is_playing: bool,
    pub cursor_index: usize,
    pub fixture_length: usize,
    pub tick_interval_ms: u64,
}

/// Plays a fixture into the arbiter, one sample per tick, forever.
///
/// The host calls [`advance`](ReplayScheduler::advance) from its frame loop with the time that
/// has passed; the scheduler accumulates it and fires one tick for every whole interval.
#[derive(Debug, Clone)]
pub struct ReplayScheduler {
    fixture: Vec<AudioSample>,
    /// Index of the sample the next tick pushes.
    cursor: usize,
    playing: bool,
    interval: Duration,
    // time accumulated towards the next tick.
    elapsed: Duration,
}

impl ReplayScheduler {
    pub fn new(interval: Duration) -> Self {
        let interval = if interval == Duration::from_millis(0) {
            log::warn!(
                "replay tick interval must be positive, using {}ms",
                DEFAULT_TICK_INTERVAL.as_millis()
            );
            DEFAULT_TICK_INTERVAL
        } else {
            interval
        };
        ReplayScheduler {
            fixture: Vec::new(),
            cursor: 0,
            playing: false,
            interval,
            elapsed: Duration::from_millis(0),
        }
    }

    /// Start (or resume) playback and take replay precedence in the arbiter.
    ///
    /// Starting counts as the first tick: the sample under the cursor is pushed straight away
    /// and the next tick moves on from it. Resuming the same fixture continues from where `stop`
    /// left off; a different fixture starts from its first sample. An empty fixture is refused.
    pub fn start(&mut self, fixture: Vec<AudioSample>, arbiter: &mut Arbiter) -> bool {
        if fixture.is_empty() {
            log::warn!("refusing to replay an empty fixture");
            return false;
        }
        if fixture != self.fixture {
            self.fixture = fixture;
            self.cursor = 0;
        }
        log::info!(
            "replaying {} samples from index {} every {}ms",
            self.fixture.len(),
            self.cursor,
            self.interval.as_millis()
        );
        self.playing = true;
        self.elapsed = Duration::from_millis(0);
        self.tick(arbiter);
        arbiter.set_replay_active(true);
        true
    }

    /// Stop ticking and hand precedence back to live/demo. The cursor is kept.
    pub fn stop(&mut self, arbiter: &mut Arbiter) {
        if self.playing {
            log::info!("replay stopped at index {}", self.cursor);
        }
        self.playing = false;
        self.elapsed = Duration::from_millis(0);
        arbiter.set_replay_active(false);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Push the sample under the cursor and move the cursor on, wrapping at the end.
    pub fn tick(&mut self, arbiter: &mut Arbiter) -> Option<AudioSample> {
        if !self.playing {
            return None;
        }
        let sample = self.fixture[self.cursor];
        arbiter.push_replay_sample(sample);
        self.cursor = (self.cursor + 1) % self.fixture.len();
        Some(sample)
    }

    /// Account for `dt` of host time, firing every tick that became due. Returns how many fired.
    pub fn advance(&mut self, dt: Duration, arbiter: &mut Arbiter) -> usize {
        if !self.playing {
            return 0;
        }
        self.elapsed += dt;
        let mut fired = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            if self.tick(arbiter).is_some() {
                fired += 1;
            }
        }
        fired
    }

    pub fn fixture(&self) -> &[AudioSample] {
        &self.fixture
    }

    pub fn state(&self) -> ReplayState {
        ReplayState {
            is_playing: self.playing,
            cursor_index: self.cursor,
            fixture_length: self.fixture.len(),
            tick_interval_ms: self.interval.as_millis() as u64,
        }
    }
}

impl Default for ReplayScheduler {
    fn default() -> Self {
        ReplayScheduler::new(DEFAULT_TICK_INTERVAL)
    }
}
