//! Rest timer between sets.
//!
//! The timer is a wall-clock-based state machine. It does not own a thread;
//! the caller calls `tick()` periodically (every [`TICK_INTERVAL_MS`]).
//! Remaining time is always recomputed as `end_at - now`, so a caller that
//! gets throttled or suspended catches up on its next tick.
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           +-- (time_left == 0) --> Idle
//! ```

use crate::{Error, RestTimerConfig, Result};
use serde::{Deserialize, Serialize};

/// How often callers are expected to tick the timer
pub const TICK_INTERVAL_MS: u64 = 100;

/// A synthesized tone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    /// Silence before this tone starts
    pub delay_ms: u32,
}

/// Played when the rest period ends
pub const TRIPLE_BEEP: [Tone; 3] = [
    Tone {
        frequency_hz: 880,
        duration_ms: 150,
        delay_ms: 0,
    },
    Tone {
        frequency_hz: 880,
        duration_ms: 150,
        delay_ms: 200,
    },
    Tone {
        frequency_hz: 1320,
        duration_ms: 300,
        delay_ms: 200,
    },
];

/// On/off durations in milliseconds, starting with "on"
pub const VIBRATION_PATTERN: [u32; 5] = [200, 100, 200, 100, 400];

/// Source of wall-clock time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Audio and haptic output at the end of a rest period.
///
/// Both are best-effort: errors are logged and otherwise ignored.
pub trait RestFeedback {
    fn beep(&mut self, tones: &[Tone]) -> Result<()>;
    fn vibrate(&mut self, pattern_ms: &[u32]) -> Result<()>;
}

/// Feedback sink that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentFeedback;

impl RestFeedback for SilentFeedback {
    fn beep(&mut self, _tones: &[Tone]) -> Result<()> {
        Ok(())
    }

    fn vibrate(&mut self, _pattern_ms: &[u32]) -> Result<()> {
        Ok(())
    }
}

/// Public snapshot of the timer, in whole seconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestTimerState {
    pub time_left: u32,
    pub total_time: u32,
    pub is_running: bool,
    pub is_paused: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestTimerEvent {
    Started { total_seconds: u32 },
    Paused { remaining_seconds: u32 },
    Resumed { remaining_seconds: u32 },
    Reset,
    Finished { total_seconds: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running { end_at_ms: u64 },
    Paused,
}

/// Countdown between sets
#[derive(Debug)]
pub struct RestTimer<C: Clock = SystemClock> {
    clock: C,
    config: RestTimerConfig,
    phase: Phase,
    total_ms: u64,
    remaining_ms: u64,
}

impl RestTimer<SystemClock> {
    pub fn new(config: RestTimerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RestTimer<C> {
    pub fn with_clock(config: RestTimerConfig, clock: C) -> Self {
        Self {
            clock,
            config,
            phase: Phase::Idle,
            total_ms: 0,
            remaining_ms: 0,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &RestTimerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn remaining_ms(&self) -> u64 {
        let remaining = match self.phase {
            Phase::Running { end_at_ms } => end_at_ms.saturating_sub(self.clock.now_ms()),
            _ => self.remaining_ms,
        };
        remaining.min(self.total_ms)
    }

    pub fn state(&self) -> RestTimerState {
        RestTimerState {
            time_left: ms_to_secs_ceil(self.remaining_ms()),
            total_time: ms_to_secs_ceil(self.total_ms),
            is_running: self.is_running(),
            is_paused: self.is_paused(),
        }
    }

    /// 0.0 .. 1.0 fraction of the rest period already elapsed
    pub fn progress(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_ms() as f64 / self.total_ms as f64)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Start a countdown of `seconds`, or the configured default.
    ///
    /// Starting while running or paused restarts from the full duration.
    pub fn start(&mut self, seconds: Option<u32>) -> Result<RestTimerEvent> {
        let seconds = seconds.unwrap_or(self.config.default_seconds);
        if seconds == 0 {
            return Err(Error::Validation(
                "rest duration must be at least one second".into(),
            ));
        }

        self.total_ms = u64::from(seconds) * 1000;
        self.remaining_ms = self.total_ms;
        self.phase = Phase::Running {
            end_at_ms: self.clock.now_ms() + self.total_ms,
        };

        tracing::debug!("Rest timer started for {}s", seconds);
        Ok(RestTimerEvent::Started {
            total_seconds: seconds,
        })
    }

    pub fn pause(&mut self) -> Option<RestTimerEvent> {
        match self.phase {
            Phase::Running { .. } => {
                self.remaining_ms = self.remaining_ms();
                self.phase = Phase::Paused;
                let remaining_seconds = ms_to_secs_ceil(self.remaining_ms);
                tracing::debug!("Rest timer paused with {}s left", remaining_seconds);
                Some(RestTimerEvent::Paused { remaining_seconds })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<RestTimerEvent> {
        match self.phase {
            Phase::Paused => {
                self.phase = Phase::Running {
                    end_at_ms: self.clock.now_ms() + self.remaining_ms,
                };
                let remaining_seconds = ms_to_secs_ceil(self.remaining_ms);
                tracing::debug!("Rest timer resumed with {}s left", remaining_seconds);
                Some(RestTimerEvent::Resumed { remaining_seconds })
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) -> RestTimerEvent {
        self.phase = Phase::Idle;
        self.total_ms = 0;
        self.remaining_ms = 0;
        RestTimerEvent::Reset
    }

    /// Call periodically. Returns `Some(Finished)` once, when the countdown
    /// reaches zero; the end-of-rest feedback is fired at that point.
    pub fn tick(&mut self, feedback: &mut impl RestFeedback) -> Option<RestTimerEvent> {
        let Phase::Running { .. } = self.phase else {
            return None;
        };

        self.remaining_ms = self.remaining_ms();
        if self.remaining_ms > 0 {
            return None;
        }

        self.phase = Phase::Idle;
        self.fire_feedback(feedback);

        let total_seconds = ms_to_secs_ceil(self.total_ms);
        tracing::info!("Rest period of {}s finished", total_seconds);
        Some(RestTimerEvent::Finished { total_seconds })
    }

    fn fire_feedback(&self, feedback: &mut impl RestFeedback) {
        if self.config.sound_enabled {
            if let Err(e) = feedback.beep(&TRIPLE_BEEP) {
                tracing::debug!("Beep unavailable: {}", e);
            }
        }
        if self.config.vibration_enabled {
            if let Err(e) = feedback.vibrate(&VIBRATION_PATTERN) {
                tracing::debug!("Vibration unavailable: {}", e);
            }
        }
    }
}

fn ms_to_secs_ceil(ms: u64) -> u32 {
    ms.div_ceil(1000).min(u64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<u64>>);

    impl ManualClock {
        fn advance_secs(&self, secs: u64) {
            self.advance_ms(secs * 1000);
        }

        fn advance_ms(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct RecordingFeedback {
        beeps: usize,
        vibrations: usize,
    }

    impl RestFeedback for RecordingFeedback {
        fn beep(&mut self, tones: &[Tone]) -> Result<()> {
            assert_eq!(tones.len(), 3);
            self.beeps += 1;
            Ok(())
        }

        fn vibrate(&mut self, _pattern_ms: &[u32]) -> Result<()> {
            self.vibrations += 1;
            Ok(())
        }
    }

    struct BrokenFeedback;

    impl RestFeedback for BrokenFeedback {
        fn beep(&mut self, _tones: &[Tone]) -> Result<()> {
            Err(Error::Other("no audio device".into()))
        }

        fn vibrate(&mut self, _pattern_ms: &[u32]) -> Result<()> {
            Err(Error::Other("no vibration motor".into()))
        }
    }

    fn timer() -> (RestTimer<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        clock.advance_secs(1_000_000);
        (
            RestTimer::with_clock(RestTimerConfig::default(), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_start_uses_configured_default() {
        let (mut t, _clock) = timer();
        let event = t.start(None).unwrap();
        assert_eq!(event, RestTimerEvent::Started { total_seconds: 90 });
        assert_eq!(
            t.state(),
            RestTimerState {
                time_left: 90,
                total_time: 90,
                is_running: true,
                is_paused: false,
            }
        );
    }

    #[test]
    fn test_zero_seconds_rejected() {
        let (mut t, _clock) = timer();
        assert!(t.start(Some(0)).is_err());
        assert!(!t.is_running());
    }

    #[test]
    fn test_countdown_follows_wall_clock() {
        let (mut t, clock) = timer();
        t.start(Some(60)).unwrap();

        // One big jump, as after the process was suspended
        clock.advance_secs(25);
        assert_eq!(t.tick(&mut SilentFeedback), None);
        assert_eq!(t.state().time_left, 35);
    }

    #[test]
    fn test_paused_time_is_not_counted() {
        let (mut t, clock) = timer();
        t.start(Some(90)).unwrap();

        clock.advance_secs(45);
        assert_eq!(
            t.pause(),
            Some(RestTimerEvent::Paused {
                remaining_seconds: 45
            })
        );

        clock.advance_secs(5);
        assert_eq!(t.state().time_left, 45);

        t.resume().unwrap();
        let left = t.state().time_left;
        assert!((44..=46).contains(&left), "expected ~45s, got {}", left);
        assert!(t.is_running());
    }

    #[test]
    fn test_pause_and_resume_only_from_valid_states() {
        let (mut t, _clock) = timer();
        assert_eq!(t.pause(), None);
        assert_eq!(t.resume(), None);

        t.start(Some(10)).unwrap();
        assert_eq!(t.resume(), None);
        assert!(t.pause().is_some());
        assert_eq!(t.pause(), None);
        assert!(t.is_paused());
    }

    #[test]
    fn test_finishes_at_exactly_zero_and_goes_idle() {
        let (mut t, clock) = timer();
        let mut feedback = RecordingFeedback::default();
        t.start(Some(3)).unwrap();

        let mut finished = None;
        for _ in 0..40 {
            clock.advance_ms(TICK_INTERVAL_MS);
            let state = t.state();
            assert!(state.time_left <= state.total_time);
            if let Some(event) = t.tick(&mut feedback) {
                finished = Some(event);
                break;
            }
        }

        assert_eq!(finished, Some(RestTimerEvent::Finished { total_seconds: 3 }));
        let state = t.state();
        assert_eq!(state.time_left, 0);
        assert!(!state.is_running);
        assert!(!state.is_paused);
        assert_eq!(feedback.beeps, 1);
        assert_eq!(feedback.vibrations, 1);

        // Further ticks are quiet
        clock.advance_secs(5);
        assert_eq!(t.tick(&mut feedback), None);
        assert_eq!(feedback.beeps, 1);
    }

    #[test]
    fn test_overshoot_clamps_to_zero() {
        let (mut t, clock) = timer();
        t.start(Some(5)).unwrap();
        clock.advance_secs(60);

        assert!(t.tick(&mut SilentFeedback).is_some());
        assert_eq!(t.state().time_left, 0);
    }

    #[test]
    fn test_feedback_respects_config() {
        let clock = ManualClock::default();
        let config = RestTimerConfig {
            default_seconds: 1,
            sound_enabled: false,
            vibration_enabled: true,
        };
        let mut t = RestTimer::with_clock(config, clock.clone());
        let mut feedback = RecordingFeedback::default();

        t.start(None).unwrap();
        clock.advance_secs(1);
        t.tick(&mut feedback).unwrap();

        assert_eq!(feedback.beeps, 0);
        assert_eq!(feedback.vibrations, 1);
    }

    #[test]
    fn test_broken_feedback_is_ignored() {
        crate::logging::init_test();
        let (mut t, clock) = timer();
        t.start(Some(1)).unwrap();
        clock.advance_secs(2);

        assert_eq!(
            t.tick(&mut BrokenFeedback),
            Some(RestTimerEvent::Finished { total_seconds: 1 })
        );
    }

    #[test]
    fn test_reset_clears_to_idle() {
        let (mut t, clock) = timer();
        t.start(Some(30)).unwrap();
        clock.advance_secs(10);
        t.pause();

        assert_eq!(t.reset(), RestTimerEvent::Reset);
        assert_eq!(
            t.state(),
            RestTimerState {
                time_left: 0,
                total_time: 0,
                is_running: false,
                is_paused: false,
            }
        );
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn test_restart_while_running() {
        let (mut t, clock) = timer();
        t.start(Some(30)).unwrap();
        clock.advance_secs(20);
        t.start(Some(45)).unwrap();
        assert_eq!(t.state().time_left, 45);
        assert_eq!(t.state().total_time, 45);
    }
}
