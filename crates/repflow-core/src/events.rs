use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Phase, PlanPosition, SetRef};
use crate::timer::TimerState;

/// Every observable state change in the engine produces a `SessionEvent`.
/// The UI collaborator consumes them to re-render; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The user actually began the workout (first phase start).
    SessionBegan {
        session_id: String,
        at: DateTime<Utc>,
    },
    SetSelected {
        set: SetRef,
        at: DateTime<Utc>,
    },
    PhaseStarted {
        phase: Phase,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    PhasePaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseResumed {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// Near-zero countdown beep on the running phase timer.
    CountdownTick {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SetCompletionToggled {
        set: SetRef,
        completed: bool,
        at: DateTime<Utc>,
    },
    ExerciseAdvanced {
        position: PlanPosition,
        at: DateTime<Utc>,
    },
    SectionChanged {
        position: PlanPosition,
        at: DateTime<Utc>,
    },
    ExerciseJumped {
        position: PlanPosition,
        at: DateTime<Utc>,
    },
    /// A fresh plan snapshot was handed in mid-session.
    PlanReplaced {
        sections: usize,
        total_sets: usize,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    SessionFinished {
        session_id: String,
        duration_min: u64,
        sets_completed: usize,
        sets_total: usize,
        at: DateTime<Utc>,
    },
    /// Full state for pollers; emitted on demand, never from transitions.
    StateSnapshot {
        phase: Option<Phase>,
        timer_state: TimerState,
        remaining_ms: u64,
        total_ms: u64,
        position: PlanPosition,
        exercise: String,
        active_set: Option<SetRef>,
        completed_sets: usize,
        total_sets: usize,
        elapsed_secs: Option<u64>,
        elapsed_hms: String,
        has_started_work: bool,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Event type tag as serialized, handy for log lines and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SessionBegan { .. } => "SessionBegan",
            SessionEvent::SetSelected { .. } => "SetSelected",
            SessionEvent::PhaseStarted { .. } => "PhaseStarted",
            SessionEvent::PhasePaused { .. } => "PhasePaused",
            SessionEvent::PhaseResumed { .. } => "PhaseResumed",
            SessionEvent::PhaseCompleted { .. } => "PhaseCompleted",
            SessionEvent::CountdownTick { .. } => "CountdownTick",
            SessionEvent::SetCompletionToggled { .. } => "SetCompletionToggled",
            SessionEvent::ExerciseAdvanced { .. } => "ExerciseAdvanced",
            SessionEvent::SectionChanged { .. } => "SectionChanged",
            SessionEvent::ExerciseJumped { .. } => "ExerciseJumped",
            SessionEvent::PlanReplaced { .. } => "PlanReplaced",
            SessionEvent::SessionReset { .. } => "SessionReset",
            SessionEvent::SessionFinished { .. } => "SessionFinished",
            SessionEvent::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_type() {
        let event = SessionEvent::PhaseStarted {
            phase: Phase::Working,
            duration_secs: 30,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PhaseStarted");
        assert_eq!(json["phase"], "working");
        assert_eq!(event.kind(), "PhaseStarted");
    }
}
