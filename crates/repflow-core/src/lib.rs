//! # Repflow Core Library
//!
//! This library provides the core logic for the repflow workout session
//! timer. It implements a CLI-first philosophy: all operations are available
//! via the standalone CLI binary, and any richer frontend is a thin layer
//! over the same engine.
//!
//! ## Architecture
//!
//! - **Phase Timers**: Wall-clock state machines that require the caller to
//!   periodically invoke `tick()` for progress; no internal threads
//! - **Session Engine**: Navigation, phase mutual exclusion, per-set
//!   completion and session duration over one validated plan
//! - **Cues**: Synthesized audio/haptic signals dispatched through a sink
//!   trait, degrading to silence when no backend is attached
//! - **Storage**: SQLite-based workout history and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`WorkoutSession`]: The session engine state machine
//! - [`SessionPlan`]: Validated plan of sections, exercises and sets
//! - [`Database`]: Workout history, statistics and live-session persistence
//! - [`Config`]: Application configuration management
//! - [`CueSink`]: Trait for audio/haptic backends

pub mod clock;
pub mod cue;
pub mod error;
pub mod events;
pub mod plan;
pub mod session;
pub mod storage;
pub mod timer;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use cue::{CueConfig, CueId, CuePlayer, CueSink, MemorySink};
pub use error::{ConfigError, CoreError, CueError, PlanError, SessionError, StorageError};
pub use events::SessionEvent;
pub use plan::{Exercise, Section, SessionPlan, SetSpec};
pub use session::{
    CompletionLog, Navigator, Phase, PlanPosition, SessionFeedback, SessionSummary, SetRef,
    WorkoutSession,
};
pub use storage::{data_dir, Config, Database, Stats};
pub use timer::{format_hms, DurationTracker, PhaseTimer, TimerState};
