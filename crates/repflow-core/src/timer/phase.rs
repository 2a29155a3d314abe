//! Single-countdown phase timer.
//!
//! A `PhaseTimer` is a wall-clock state machine: no internal thread, the
//! owner calls [`PhaseTimer::tick`] periodically with the current time.
//! Elapsed time is flushed from timestamps, so a timer that was serialized,
//! stored and reloaded catches up on its first tick.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Completed)
//! ```
//!
//! Completion is reported exactly once per generation; `reset` bumps the
//! generation so anything still holding a completion from the old run can
//! be recognized as stale and dropped.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// What a tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    /// Crossed into a whole second at or below the countdown-cue threshold.
    /// Fired at most once per integer second.
    Countdown { remaining_secs: u32 },
    /// The countdown hit zero. Carries the generation it belongs to.
    Completed { generation: u64 },
}

/// A single countdown with a fixed duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTimer {
    state: TimerState,
    total_ms: u64,
    remaining_ms: u64,
    /// Epoch-millis of the last resume or tick while running. `None` unless
    /// `Running`.
    #[serde(default)]
    last_tick_ms: Option<u64>,
    /// Bumped on every reset; completion signals carry the value they were
    /// produced under.
    #[serde(default)]
    generation: u64,
    /// Countdown cues fire for whole seconds in `1..=countdown_from`.
    /// `None` disables them.
    #[serde(default)]
    countdown_from: Option<u32>,
    /// Last whole second a countdown cue fired for.
    #[serde(default)]
    last_countdown_cue: Option<u32>,
}

impl PhaseTimer {
    pub fn new(duration_secs: u32) -> Self {
        let total_ms = u64::from(duration_secs).saturating_mul(1000);
        Self {
            state: TimerState::Idle,
            total_ms,
            remaining_ms: total_ms,
            last_tick_ms: None,
            generation: 0,
            countdown_from: None,
            last_countdown_cue: None,
        }
    }

    /// Enable near-zero countdown cues for `1..=from_secs`.
    pub fn with_countdown_cues(mut self, from_secs: u32) -> Self {
        self.countdown_from = Some(from_secs);
        self
    }

    // === Queries ===

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Remaining whole seconds, rounded up so a display reads 30 until the
    /// countdown actually passes 29.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_ms.div_ceil(1000).min(u64::from(u32::MAX)) as u32
    }

    /// 0.0 .. 1.0 progress within the countdown.
    pub fn progress(&self) -> f64 {
        if self.total_ms == 0 {
            return 1.0;
        }
        1.0 - (self.remaining_ms as f64 / self.total_ms as f64)
    }

    // === Commands ===

    /// `Idle -> Running` with a full countdown, or `Paused -> Running`
    /// keeping the remaining time.
    pub fn start(&mut self, now_ms: u64) -> Result<(), SessionError> {
        match self.state {
            TimerState::Idle => {
                self.remaining_ms = self.total_ms;
                self.last_countdown_cue = None;
                self.state = TimerState::Running;
                self.last_tick_ms = Some(now_ms);
                Ok(())
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                self.last_tick_ms = Some(now_ms);
                Ok(())
            }
            TimerState::Running => Err(SessionError::InvalidTransition("timer already running")),
            TimerState::Completed => {
                Err(SessionError::InvalidTransition("timer already completed"))
            }
        }
    }

    /// `Running -> Paused`, preserving the remaining time. Returns the
    /// remaining milliseconds, or `None` if the timer was not running.
    pub fn pause(&mut self, now_ms: u64) -> Option<u64> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now_ms);
        self.state = TimerState::Paused;
        self.last_tick_ms = None;
        Some(self.remaining_ms)
    }

    /// Force `Idle` with a new duration, cancelling any in-flight
    /// completion. Bumps the generation so stale completion signals can be
    /// told apart from live ones.
    pub fn reset(&mut self, duration_secs: u32) {
        let total_ms = u64::from(duration_secs).saturating_mul(1000);
        self.state = TimerState::Idle;
        self.total_ms = total_ms;
        self.remaining_ms = total_ms;
        self.last_tick_ms = None;
        self.last_countdown_cue = None;
        self.generation += 1;
    }

    /// Flush wall-clock elapsed time and report at most one signal.
    ///
    /// Reaching zero transitions to `Completed` and reports it exactly
    /// once; ticking a completed timer does nothing. A completion
    /// suppresses countdown cues from the same flush: after a long gap
    /// (reload) the caller should hear the completion, not a burst of
    /// stale beeps.
    pub fn tick(&mut self, now_ms: u64) -> Option<TimerSignal> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now_ms);

        if self.remaining_ms == 0 {
            self.state = TimerState::Completed;
            self.last_tick_ms = None;
            return Some(TimerSignal::Completed {
                generation: self.generation,
            });
        }

        if let Some(threshold) = self.countdown_from {
            let second = self.remaining_secs();
            if second <= threshold && self.last_countdown_cue != Some(second) {
                self.last_countdown_cue = Some(second);
                return Some(TimerSignal::Countdown {
                    remaining_secs: second,
                });
            }
        }
        None
    }

    // === Internal ===

    fn flush_elapsed(&mut self, now_ms: u64) {
        if let Some(last) = self.last_tick_ms {
            let elapsed = now_ms.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_ms = Some(now_ms);
        }
    }
}
