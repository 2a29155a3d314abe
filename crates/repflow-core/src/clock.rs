//! Wall-clock access behind a trait.
//!
//! All timing in the engine derives from timestamps taken here rather than
//! from in-memory counters, so elapsed time survives a process restart.
//! Tests inject a [`ManualClock`] and advance it explicitly.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

/// A source of the current wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as milliseconds since the Unix epoch.
    ///
    /// Pre-epoch times clamp to zero. Timer internals work in epoch-millis;
    /// `DateTime` is for event timestamps and persistence.
    fn now_ms(&self) -> u64 {
        self.now().timestamp_millis().max(0) as u64
    }
}

/// Shared handle to a clock, cloneable across the engine and its timers.
pub type SharedClock = Arc<dyn Clock>;

/// Returns the default system clock handle. Used by serde when an engine is
/// deserialized from the kv store, where no clock was persisted.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. For tests and deterministic replay.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock starting at the given instant.
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(at)),
        }
    }

    /// Advance the clock by a positive duration.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap();
        *current += by;
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    /// Jump to an absolute instant. Allowed to move backwards; consumers
    /// clamp negative elapsed to zero.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap();
        *current = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(Utc.timestamp_opt(0, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
