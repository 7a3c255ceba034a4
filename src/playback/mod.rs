//! Playback controller
//!
//! Owns the position within a trace and the auto-advance timer. The timer is a
//! single deadline that the event loop polls with [`PlaybackController::tick`];
//! it is armed when playback starts, re-armed when the speed changes, and
//! dropped on pause or reset.
//!
//! ```text
//! Stopped ──load(n>0)──▶ Ready ──play──▶ Playing ◀──play/pause──▶ Paused
//!    ▲                     ▲                                          │
//!    └────── load(0) ──────┴──────────────── load / reset ────────────┘
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

/// Speed used before any explicit choice
pub const DEFAULT_SPEED: f64 = 1.0;

/// Interval between auto-advance ticks at 1× speed
pub const BASE_INTERVAL: Duration = Duration::from_millis(1000);

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No trace loaded (or the trace has no frames)
    Stopped,
    /// Trace loaded, not yet played
    Ready,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Speed multipliers must be finite and strictly positive
    InvalidSpeed(f64),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::InvalidSpeed(speed) => {
                write!(f, "Invalid playback speed {}: must be greater than 0", speed)
            }
        }
    }
}

impl std::error::Error for PlaybackError {}

/// Current index, play state and speed over a trace of `len` frames
#[derive(Debug, Clone)]
pub struct PlaybackController {
    len: usize,
    current_index: usize,
    speed: f64,
    state: PlaybackState,
    /// When the next auto-advance is due; `Some` only while playing
    next_tick: Option<Instant>,
}

impl PlaybackController {
    pub fn new() -> Self {
        PlaybackController {
            len: 0,
            current_index: 0,
            speed: DEFAULT_SPEED,
            state: PlaybackState::Stopped,
            next_tick: None,
        }
    }

    /// Start over on a trace of `len` frames. The speed multiplier is kept.
    pub fn load(&mut self, len: usize) {
        self.len = len;
        self.current_index = 0;
        self.next_tick = None;
        self.state = if len == 0 {
            PlaybackState::Stopped
        } else {
            PlaybackState::Ready
        };
        debug!(len, speed = self.speed, "playback loaded");
    }

    /// Drop the trace entirely
    pub fn reset(&mut self) {
        self.load(0);
    }

    pub fn play(&mut self, now: Instant) {
        match self.state {
            PlaybackState::Ready | PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                self.next_tick = Some(now + self.interval());
                debug!(index = self.current_index, "playback started");
            }
            PlaybackState::Playing | PlaybackState::Stopped => {}
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.next_tick = None;
            debug!(index = self.current_index, "playback paused");
        }
    }

    /// Play if not playing, pause if playing
    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Move by `delta` frames, clamped to the trace. Play state is unchanged.
    pub fn step(&mut self, delta: isize) {
        let target = if delta.is_negative() {
            self.current_index.saturating_sub(delta.unsigned_abs())
        } else {
            self.current_index.saturating_add(delta.unsigned_abs())
        };
        self.seek(target);
    }

    /// Jump to `index`, clamped to the trace
    pub fn seek(&mut self, index: usize) {
        self.current_index = index.min(self.last_index());
    }

    /// Change the speed multiplier. While playing, the pending tick is re-armed
    /// with the new interval starting at `now`.
    pub fn set_speed(&mut self, speed: f64, now: Instant) -> Result<(), PlaybackError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlaybackError::InvalidSpeed(speed));
        }
        self.speed = speed;
        if self.next_tick.is_some() {
            self.next_tick = Some(now + self.interval());
        }
        debug!(speed, "playback speed changed");
        Ok(())
    }

    /// Advance one frame if a tick is due. Returns whether the index moved.
    ///
    /// Reaching the last frame does not pause: the controller keeps playing
    /// with nothing left to show until it is paused or sought back.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_tick else {
            return false;
        };
        if now < due {
            return false;
        }

        self.next_tick = Some(now + self.interval());
        let before = self.current_index;
        self.current_index = (self.current_index + 1).min(self.last_index());
        self.current_index != before
    }

    /// Time between auto-advance ticks at the current speed
    pub fn interval(&self) -> Duration {
        BASE_INTERVAL.div_f64(self.speed)
    }

    /// How long until the next tick, if one is armed
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|due| due.saturating_duration_since(now))
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_at_start(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.current_index == self.last_index()
    }

    fn last_index(&self) -> usize {
        self.len.saturating_sub(1)
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(len: usize) -> PlaybackController {
        let mut controller = PlaybackController::new();
        controller.load(len);
        controller
    }

    #[test]
    fn test_initial_state() {
        let controller = PlaybackController::new();
        assert_eq!(controller.state(), PlaybackState::Stopped);
        assert_eq!(controller.current_index(), 0);
        assert_eq!(controller.speed(), DEFAULT_SPEED);
    }

    #[test]
    fn test_step_clamps_at_both_ends() {
        let mut controller = loaded(3);
        controller.step(-1);
        assert_eq!(controller.current_index(), 0);

        controller.seek(2);
        controller.step(1);
        assert_eq!(controller.current_index(), 2);

        controller.seek(100);
        assert_eq!(controller.current_index(), 2);
        controller.step(-5);
        assert_eq!(controller.current_index(), 0);
    }

    #[test]
    fn test_play_pause_transitions() {
        let now = Instant::now();
        let mut controller = loaded(3);
        assert_eq!(controller.state(), PlaybackState::Ready);

        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Ready);

        controller.play(now);
        assert_eq!(controller.state(), PlaybackState::Playing);
        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Paused);
        controller.step(1);
        assert_eq!(controller.state(), PlaybackState::Paused);
        controller.toggle(now);
        assert!(controller.is_playing());
    }

    #[test]
    fn test_play_on_empty_trace_is_noop() {
        let mut controller = loaded(0);
        controller.play(Instant::now());
        assert_eq!(controller.state(), PlaybackState::Stopped);
        assert_eq!(controller.time_until_tick(Instant::now()), None);
    }

    #[test]
    fn test_tick_advances_on_interval() {
        let start = Instant::now();
        let mut controller = loaded(3);
        controller.play(start);

        assert!(!controller.tick(start + Duration::from_millis(999)));
        assert!(controller.tick(start + Duration::from_millis(1000)));
        assert_eq!(controller.current_index(), 1);
    }

    #[test]
    fn test_tick_keeps_playing_at_last_frame() {
        let mut now = Instant::now();
        let mut controller = loaded(2);
        controller.play(now);

        now += BASE_INTERVAL;
        assert!(controller.tick(now));
        now += BASE_INTERVAL;
        assert!(!controller.tick(now));
        assert_eq!(controller.current_index(), 1);
        assert!(controller.is_playing());

        controller.seek(0);
        now += BASE_INTERVAL;
        assert!(controller.tick(now));
        assert_eq!(controller.current_index(), 1);
    }

    #[test]
    fn test_no_tick_while_paused() {
        let start = Instant::now();
        let mut controller = loaded(3);
        controller.play(start);
        controller.pause();
        assert!(!controller.tick(start + Duration::from_secs(10)));
        assert_eq!(controller.current_index(), 0);
    }

    #[test]
    fn test_set_speed_rearms_pending_tick() {
        let start = Instant::now();
        let mut controller = loaded(5);
        controller.play(start);

        let later = start + Duration::from_millis(600);
        controller.set_speed(2.0, later).unwrap();
        assert_eq!(controller.interval(), Duration::from_millis(500));
        assert!(!controller.tick(later + Duration::from_millis(499)));
        assert!(controller.tick(later + Duration::from_millis(500)));
    }

    #[test]
    fn test_set_speed_rejects_non_positive() {
        let mut controller = loaded(1);
        let now = Instant::now();
        assert_eq!(
            controller.set_speed(0.0, now),
            Err(PlaybackError::InvalidSpeed(0.0))
        );
        assert!(controller.set_speed(-1.0, now).is_err());
        assert!(controller.set_speed(f64::NAN, now).is_err());
        assert_eq!(controller.speed(), DEFAULT_SPEED);
    }

    #[test]
    fn test_load_keeps_speed_and_resets_position() {
        let now = Instant::now();
        let mut controller = loaded(4);
        controller.set_speed(2.5, now).unwrap();
        controller.seek(3);
        controller.play(now);

        controller.load(6);
        assert_eq!(controller.state(), PlaybackState::Ready);
        assert_eq!(controller.current_index(), 0);
        assert_eq!(controller.speed(), 2.5);
        assert_eq!(controller.time_until_tick(now), None);
    }
}
