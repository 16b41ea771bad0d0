//! Arbitration between the live socket, the replayed recording and synthesized demo motion.
use crate::{
    data::{AudioSample, DataSourceMode},
    normalize::{finite_or_zero, synthesize_demo_sample},
};
use room_telemetry::Reading;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// Something that can tell whether the live telemetry connection is currently open.
///
/// The arbiter asks on every query rather than caching the answer, because the socket can close
/// at any time on another thread.
pub trait LiveLink {
    fn is_open(&self) -> bool;
}

/// A shared open/closed flag, flipped by whoever owns the socket.
#[derive(Debug, Clone, Default)]
pub struct LiveStatus(Arc<AtomicBool>);

impl LiveStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_open(&self, open: bool) {
        self.0.store(open, Ordering::SeqCst);
    }
}

impl LiveLink for LiveStatus {
    fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// For hosts that never connect anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLink;

impl LiveLink for NoLink {
    fn is_open(&self) -> bool {
        false
    }
}

/// Wall-clock seconds, used to synthesize demo motion.
pub trait Clock {
    fn now_seconds(&self) -> f64;
}

impl<F: Fn() -> f64> Clock for F {
    fn now_seconds(&self) -> f64 {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// The arbiter's answer for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Current {
    pub mode: DataSourceMode,
    pub sample: AudioSample,
}

/// Decides which source is authoritative and hands out its sample.
///
/// Precedence is replay, then live (if the link is open and has delivered something), then
/// demo. Demo samples are never stored: every query synthesizes a fresh one from the clock.
pub struct Arbiter {
    link: Box<dyn LiveLink>,
    clock: Box<dyn Clock>,
    live_sample: Option<AudioSample>,
    replay_sample: Option<AudioSample>,
    replay_active: bool,
    live_history: VecDeque<AudioSample>,
    history_len: usize,
}

impl Arbiter {
    pub fn new(link: impl LiveLink + 'static, clock: impl Clock + 'static, history_len: usize) -> Self {
        Arbiter {
            link: Box::new(link),
            clock: Box::new(clock),
            live_sample: None,
            replay_sample: None,
            replay_active: false,
            live_history: VecDeque::with_capacity(history_len),
            history_len,
        }
    }

    /// Resolve the source and its sample in one go. Call this once per frame and use the result
    /// for everything drawn in that frame.
    pub fn current(&self) -> Current {
        if self.replay_active {
            if let Some(sample) = self.replay_sample {
                return Current {
                    mode: DataSourceMode::Replay,
                    sample,
                };
            }
        }
        if self.link.is_open() {
            if let Some(sample) = self.live_sample {
                return Current {
                    mode: DataSourceMode::Live,
                    sample,
                };
            }
        }
        Current {
            mode: DataSourceMode::Demo,
            sample: synthesize_demo_sample(self.clock.now_seconds()),
        }
    }

    pub fn current_sample(&self) -> AudioSample {
        self.current().sample
    }

    pub fn active_mode(&self) -> DataSourceMode {
        self.current().mode
    }

    /// Accept a live sample as-is (apart from zeroing non-finite fields).
    pub fn on_live_sample(&mut self, sample: AudioSample) {
        let sample = sample.sanitized();
        if self.history_len > 0 {
            if self.live_history.len() == self.history_len {
                self.live_history.pop_front();
            }
            self.live_history.push_back(sample);
        }
        self.live_sample = Some(sample);
    }

    /// Accept a raw board frame. Missing levels count as 0; a missing difference or average is
    /// derived from the levels, anything the board did send is trusted.
    pub fn on_live_reading(&mut self, reading: &Reading) {
        let left = reading.left_mic.map(finite_or_zero).unwrap_or(0.0);
        let right = reading.right_mic.map(finite_or_zero).unwrap_or(0.0);
        let derived = AudioSample::from_levels(
            left,
            right,
            reading
                .timestamp
                .unwrap_or_else(|| (self.clock.now_seconds() * 1000.0) as i64),
        );
        self.on_live_sample(AudioSample {
            difference: reading.difference.unwrap_or(derived.difference),
            average_level: reading.average_level.unwrap_or(derived.average_level),
            ..derived
        });
    }

    pub fn set_replay_active(&mut self, active: bool) {
        if active != self.replay_active {
            log::debug!("replay precedence {}", if active { "on" } else { "off" });
        }
        self.replay_active = active;
    }

    pub fn is_replay_active(&self) -> bool {
        self.replay_active
    }

    pub fn push_replay_sample(&mut self, sample: AudioSample) {
        self.replay_sample = Some(sample.sanitized());
    }

    /// The most recent live samples, oldest first.
    pub fn live_history(&self) -> impl Iterator<Item = &AudioSample> + '_ {
        self.live_history.iter()
    }

    pub fn has_live_history(&self) -> bool {
        !self.live_history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    fn manual_clock() -> (Rc<Cell<f64>>, impl Clock) {
        let time = Rc::new(Cell::new(100.0));
        let handle = time.clone();
        (time, move || handle.get())
    }

    fn sample(left: f64, right: f64) -> AudioSample {
        AudioSample::from_levels(left, right, 0)
    }

    #[test]
    fn demo_when_nothing_connected() {
        let (time, clock) = manual_clock();
        let arbiter = Arbiter::new(LiveStatus::new(), clock, 10);
        assert_eq!(arbiter.active_mode(), DataSourceMode::Demo);
        let first = arbiter.current_sample();
        time.set(101.3);
        let second = arbiter.current_sample();
        assert_ne!(first, second);
        assert_eq!(second, synthesize_demo_sample(101.3));
    }

    #[test]
    fn live_needs_an_open_link() {
        let (_time, clock) = manual_clock();
        let link = LiveStatus::new();
        let mut arbiter = Arbiter::new(link.clone(), clock, 10);
        arbiter.on_live_sample(sample(70.0, 60.0));
        assert_eq!(arbiter.active_mode(), DataSourceMode::Demo);
        link.set_open(true);
        assert_eq!(arbiter.active_mode(), DataSourceMode::Live);
        assert_eq!(arbiter.current_sample(), sample(70.0, 60.0));
        // socket drops: next query falls back without any explicit event
        link.set_open(false);
        assert_eq!(arbiter.active_mode(), DataSourceMode::Demo);
    }

    #[test]
    fn open_link_without_data_is_demo() {
        let (_time, clock) = manual_clock();
        let link = LiveStatus::new();
        link.set_open(true);
        let arbiter = Arbiter::new(link, clock, 10);
        assert_eq!(arbiter.active_mode(), DataSourceMode::Demo);
    }

    #[test]
    fn replay_beats_live() {
        let (_time, clock) = manual_clock();
        let link = LiveStatus::new();
        link.set_open(true);
        let mut arbiter = Arbiter::new(link, clock, 10);
        arbiter.on_live_sample(sample(70.0, 60.0));
        arbiter.push_replay_sample(sample(55.0, 70.0));
        arbiter.set_replay_active(true);
        assert_eq!(
            arbiter.current(),
            Current {
                mode: DataSourceMode::Replay,
                sample: sample(55.0, 70.0)
            }
        );
        arbiter.set_replay_active(false);
        assert_eq!(arbiter.current_sample(), sample(70.0, 60.0));
    }

    #[test]
    fn reading_without_difference() {
        let (_time, clock) = manual_clock();
        let mut arbiter = Arbiter::new(LiveStatus::new(), clock, 10);
        arbiter.on_live_reading(&Reading {
            left_mic: Some(75.0),
            right_mic: Some(58.0),
            ..Reading::default()
        });
        let s = arbiter.live_history().last().copied().unwrap();
        assert_eq!(s.difference, 17.0);
        assert_eq!(s.average_level, 66.5);
        assert_eq!(s.timestamp_ms, 100_000);
    }

    #[test]
    fn reading_values_are_trusted() {
        let (_time, clock) = manual_clock();
        let mut arbiter = Arbiter::new(LiveStatus::new(), clock, 10);
        arbiter.on_live_reading(&Reading {
            left_mic: Some(60.0),
            right_mic: None,
            difference: Some(3.0),
            average_level: None,
            timestamp: Some(5),
        });
        let s = arbiter.live_history().last().copied().unwrap();
        assert_eq!(s.right_level, 0.0);
        assert_eq!(s.difference, 3.0);
        assert_eq!(s.average_level, 30.0);
        assert_eq!(s.timestamp_ms, 5);
    }

    #[test]
    fn history_is_bounded() {
        let (_time, clock) = manual_clock();
        let mut arbiter = Arbiter::new(LiveStatus::new(), clock, 3);
        for i in 0..5 {
            arbiter.on_live_sample(sample(i as f64, 0.0));
        }
        let levels: Vec<f64> = arbiter.live_history().map(|s| s.left_level).collect();
        assert_eq!(levels, vec![2.0, 3.0, 4.0]);
    }
}
