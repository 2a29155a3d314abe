//! Session duration derived from a fixed start instant.
//!
//! The tracker never counts ticks: `elapsed` recomputes `now - started_at`
//! every call, so it cannot drift and it self-heals across reloads once the
//! start instant is restored from the kv store
//! (`Database::load_session_start`).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationTracker {
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

impl DurationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of the workout. Fails if already started; callers
    /// that want idempotency check [`DurationTracker::is_started`] first.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SessionError> {
        if let Some(started_at) = self.started_at {
            return Err(SessionError::AlreadyStarted { started_at });
        }
        self.started_at = Some(now);
        Ok(now)
    }

    /// Reload path: adopt a persisted start instant. Last write wins.
    pub fn restore(&mut self, started_at: DateTime<Utc>) {
        self.started_at = Some(started_at);
    }

    /// Drop the start instant (session completed or abandoned).
    pub fn clear(&mut self) {
        self.started_at = None;
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Elapsed wall time since the start, or `None` if not started.
    /// Clock skew backwards clamps to zero.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let started_at = self.started_at?;
        let elapsed = now - started_at;
        Some(elapsed.max(Duration::zero()))
    }

    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.elapsed(now).map(|d| d.num_seconds().max(0) as u64)
    }

    /// `HH:MM:SS`, or the `--:--:--` placeholder when not started.
    pub fn display(&self, now: DateTime<Utc>) -> String {
        format_hms(self.elapsed_secs(now))
    }
}

/// Render whole seconds as `HH:MM:SS`; `None` renders the undefined
/// placeholder.
pub fn format_hms(elapsed_secs: Option<u64>) -> String {
    match elapsed_secs {
        Some(secs) => format!(
            "{:02}:{:02}:{:02}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ),
        None => "--:--:--".into(),
    }
}
