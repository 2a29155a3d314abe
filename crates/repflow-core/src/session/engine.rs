//! Workout session engine.
//!
//! The engine is a wall-clock state machine over one plan: it owns the
//! navigator, the per-set completion log, the session duration tracker and
//! at most one active phase timer. It does not use internal threads - the
//! caller drives it by calling `tick()` periodically.
//!
//! ## Phase transitions
//!
//! ```text
//! Idle -> Preparing -> Working -> Idle
//!      -> Working   -> Idle            (after the first work phase)
//!      -> Resting   -> Idle
//! ```
//!
//! `Idle` (no active phase) is both the initial state and the parking spot
//! between sets; there is no terminal state, the user finishes explicitly.
//! The preparation countdown runs only before the first work phase of a
//! run; `has_started_work` latches once `Working` begins and only
//! `reset_all` re-arms it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = WorkoutSession::new(SessionPlan::sample());
//! session.select_set(SetRef { section: 0, exercise: 0, set: 0 })?;
//! session.start_work();
//! // In a loop:
//! session.tick(); // Returns events as phases progress.
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{system_clock, SharedClock};
use crate::cue::{CueId, CuePlayer};
use crate::error::{PlanError, SessionError};
use crate::events::SessionEvent;
use crate::plan::{Exercise, SessionPlan, SetSpec};
use crate::timer::{DurationTracker, PhaseTimer, TimerSignal, TimerState};

use super::navigator::{Navigator, PlanPosition};
use super::summary::{CompletionLog, SessionFeedback, SessionSummary};

/// Default preparation countdown before the first work phase.
pub const DEFAULT_PREP_SECS: u32 = 5;
/// Default threshold for near-zero countdown beeps.
pub const DEFAULT_COUNTDOWN_CUE_SECS: u32 = 3;

/// The kind of countdown currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preparing,
    Working,
    Resting,
}

/// Fully-qualified set coordinates within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRef {
    pub section: usize,
    pub exercise: usize,
    pub set: usize,
}

/// The one phase allowed to run at a time. Holding the timer inside the
/// `Option` makes mutual exclusion structural: swapping the phase drops
/// the old timer with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivePhase {
    kind: Phase,
    timer: PhaseTimer,
    /// Timer generation this phase was armed with. A completion signal
    /// carrying any other generation is stale and gets dropped.
    armed_generation: u64,
}

/// Session engine over one validated plan.
///
/// Serializable: the whole engine round-trips through JSON so a process
/// restart can pick a session back up mid-phase. The clock and cue player
/// are runtime collaborators and get re-attached after deserialization
/// (defaults: system clock, silent cues).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    plan: SessionPlan,
    navigator: Navigator,
    #[serde(default)]
    active_set: Option<SetRef>,
    #[serde(default)]
    phase: Option<ActivePhase>,
    #[serde(default)]
    completed: CompletionLog,
    #[serde(default)]
    has_started_work: bool,
    #[serde(default)]
    duration: DurationTracker,
    session_id: Uuid,
    #[serde(default = "default_prep_secs")]
    prep_secs: u32,
    #[serde(default = "default_countdown_cue_secs")]
    countdown_cue_secs: u32,
    #[serde(skip, default = "system_clock")]
    clock: SharedClock,
    #[serde(skip, default)]
    cues: CuePlayer,
}

fn default_prep_secs() -> u32 {
    DEFAULT_PREP_SECS
}

fn default_countdown_cue_secs() -> u32 {
    DEFAULT_COUNTDOWN_CUE_SECS
}

impl WorkoutSession {
    pub fn new(plan: SessionPlan) -> Self {
        Self {
            plan,
            navigator: Navigator::new(),
            active_set: None,
            phase: None,
            completed: CompletionLog::new(),
            has_started_work: false,
            duration: DurationTracker::default(),
            session_id: Uuid::new_v4(),
            prep_secs: DEFAULT_PREP_SECS,
            countdown_cue_secs: DEFAULT_COUNTDOWN_CUE_SECS,
            clock: system_clock(),
            cues: CuePlayer::default(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cues(mut self, cues: CuePlayer) -> Self {
        self.cues = cues;
        self
    }

    /// Re-attach the clock after deserialization.
    pub fn set_clock(&mut self, clock: SharedClock) {
        self.clock = clock;
    }

    /// Re-attach the cue player after deserialization.
    pub fn set_cues(&mut self, cues: CuePlayer) {
        self.cues = cues;
    }

    /// Apply timing knobs from config. Affects the next phase start only.
    pub fn set_timing(&mut self, prep_secs: u32, countdown_cue_secs: u32) {
        self.prep_secs = prep_secs;
        self.countdown_cue_secs = countdown_cue_secs;
    }

    // === Queries ===

    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn position(&self) -> PlanPosition {
        self.navigator.position()
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.navigator.current(&self.plan)
    }

    pub fn upcoming(&self) -> &[Exercise] {
        self.navigator.upcoming(&self.plan)
    }

    pub fn previous(&self) -> &[Exercise] {
        self.navigator.previous(&self.plan)
    }

    pub fn active_set(&self) -> Option<SetRef> {
        self.active_set
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase.as_ref().map(|p| p.kind)
    }

    pub fn timer_state(&self) -> TimerState {
        self.phase
            .as_ref()
            .map(|p| p.timer.state())
            .unwrap_or(TimerState::Idle)
    }

    pub fn remaining_ms(&self) -> u64 {
        self.phase.as_ref().map(|p| p.timer.remaining_ms()).unwrap_or(0)
    }

    pub fn total_ms(&self) -> u64 {
        self.phase.as_ref().map(|p| p.timer.total_ms()).unwrap_or(0)
    }

    pub fn has_started_work(&self) -> bool {
        self.has_started_work
    }

    pub fn started_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.duration.started_at()
    }

    pub fn elapsed_secs(&self) -> Option<u64> {
        self.duration.elapsed_secs(self.clock.now())
    }

    pub fn completion(&self) -> &CompletionLog {
        &self.completed
    }

    pub fn is_set_done(&self, set: SetRef) -> bool {
        self.completed.is_done(set.section, set.exercise, set.set)
    }

    /// Full state for pollers; emitted on demand, never from transitions.
    pub fn snapshot(&self) -> SessionEvent {
        let elapsed_secs = self.elapsed_secs();
        SessionEvent::StateSnapshot {
            phase: self.phase(),
            timer_state: self.timer_state(),
            remaining_ms: self.remaining_ms(),
            total_ms: self.total_ms(),
            position: self.navigator.position(),
            exercise: self
                .current_exercise()
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            active_set: self.active_set,
            completed_sets: self.completed.completed_count(),
            total_sets: self.plan.total_sets(),
            elapsed_secs,
            elapsed_hms: crate::timer::format_hms(elapsed_secs),
            has_started_work: self.has_started_work,
            at: self.clock.now(),
        }
    }

    // === Commands ===

    /// Make a set the active one. Halts whatever phase was running; never
    /// starts a timer. The preparation latch is untouched, so switching
    /// sets mid-run does not bring the prep countdown back.
    pub fn select_set(&mut self, set: SetRef) -> Result<SessionEvent, SessionError> {
        if self.plan.set(set.section, set.exercise, set.set).is_none() {
            return Err(SessionError::InvalidPosition {
                section: set.section,
                exercise: set.exercise,
                set: set.set,
            });
        }
        self.phase = None;
        self.active_set = Some(set);
        Ok(SessionEvent::SetSelected {
            set,
            at: self.clock.now(),
        })
    }

    /// Start the work countdown for the active set.
    ///
    /// Rep-based sets have no work timer: empty result. The first
    /// activation of a run goes through `Preparing` first; later ones go
    /// straight to `Working`. Any running phase (typically a rest) is
    /// cancelled implicitly. The first phase start of the session also
    /// starts the duration tracker.
    pub fn start_work(&mut self) -> Vec<SessionEvent> {
        let Some(set) = self.active_set else {
            return Vec::new();
        };
        let Some(spec) = self.plan.set(set.section, set.exercise, set.set) else {
            return Vec::new();
        };
        let Some(work_secs) = spec.work_secs() else {
            // Rep-based: the athlete counts, the engine stays quiet.
            return Vec::new();
        };

        let mut events = self.begin_if_needed();
        self.phase = None;

        if self.has_started_work || self.prep_secs == 0 {
            events.push(self.arm_phase(Phase::Working, work_secs));
            self.has_started_work = true;
        } else {
            events.push(self.arm_phase(Phase::Preparing, self.prep_secs));
        }
        events
    }

    /// Start the rest countdown for the active set, cancelling any running
    /// phase first. Works for both set kinds.
    pub fn start_rest(&mut self) -> Vec<SessionEvent> {
        let Some(set) = self.active_set else {
            return Vec::new();
        };
        let Some(spec) = self.plan.set(set.section, set.exercise, set.set) else {
            return Vec::new();
        };
        let rest_secs = spec.rest_secs();

        let mut events = self.begin_if_needed();
        self.phase = None;
        events.push(self.arm_phase(Phase::Resting, rest_secs));
        events
    }

    /// Drive the active timer. Returns countdown and completion events as
    /// they happen; on preparation completion the work phase starts
    /// automatically.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let now_ms = self.clock.now_ms();
        let Some(active) = self.phase.as_mut() else {
            return Vec::new();
        };
        let kind = active.kind;
        let armed = active.armed_generation;

        match active.timer.tick(now_ms) {
            None => Vec::new(),
            Some(TimerSignal::Countdown { remaining_secs }) => {
                self.cues.play(CueId::Tick);
                vec![SessionEvent::CountdownTick {
                    remaining_secs,
                    at: self.clock.now(),
                }]
            }
            Some(TimerSignal::Completed { generation }) => {
                if generation != armed {
                    tracing::debug!(kind = ?kind, generation, armed, "stale completion dropped");
                    return Vec::new();
                }
                self.complete_phase(kind)
            }
        }
    }

    /// Pause the running phase timer. No-op when nothing is running.
    pub fn pause_phase(&mut self) -> Option<SessionEvent> {
        let now_ms = self.clock.now_ms();
        let active = self.phase.as_mut()?;
        let remaining_ms = active.timer.pause(now_ms)?;
        Some(SessionEvent::PhasePaused {
            phase: active.kind,
            remaining_ms,
            at: self.clock.now(),
        })
    }

    /// Resume a paused phase timer. No-op unless paused.
    pub fn resume_phase(&mut self) -> Option<SessionEvent> {
        let now_ms = self.clock.now_ms();
        let active = self.phase.as_mut()?;
        if active.timer.state() != TimerState::Paused {
            return None;
        }
        active.timer.start(now_ms).ok()?;
        Some(SessionEvent::PhaseResumed {
            phase: active.kind,
            remaining_ms: active.timer.remaining_ms(),
            at: self.clock.now(),
        })
    }

    /// Flip one set's completion mark. Independent of the active phase and
    /// the active set.
    pub fn toggle_set_completion(&mut self, set: SetRef) -> Result<SessionEvent, SessionError> {
        let completed = self
            .completed
            .toggle(&self.plan, set.section, set.exercise, set.set)?;
        Ok(SessionEvent::SetCompletionToggled {
            set,
            completed,
            at: self.clock.now(),
        })
    }

    pub fn advance_exercise(&mut self) -> SessionEvent {
        self.navigator.advance_exercise(&self.plan);
        SessionEvent::ExerciseAdvanced {
            position: self.navigator.position(),
            at: self.clock.now(),
        }
    }

    pub fn advance_section(&mut self) -> SessionEvent {
        self.navigator.advance_section(&self.plan);
        SessionEvent::SectionChanged {
            position: self.navigator.position(),
            at: self.clock.now(),
        }
    }

    pub fn retreat_section(&mut self) -> SessionEvent {
        self.navigator.retreat_section(&self.plan);
        SessionEvent::SectionChanged {
            position: self.navigator.position(),
            at: self.clock.now(),
        }
    }

    pub fn jump_to_exercise(&mut self, index: usize) -> Result<SessionEvent, SessionError> {
        self.navigator.jump_to_exercise(&self.plan, index)?;
        Ok(SessionEvent::ExerciseJumped {
            position: self.navigator.position(),
            at: self.clock.now(),
        })
    }

    /// Halt everything and re-arm the preparation countdown. Completion
    /// marks and the running duration survive; this is "start my sets
    /// over", not "end the session".
    pub fn reset_all(&mut self) -> SessionEvent {
        self.phase = None;
        self.active_set = None;
        self.has_started_work = false;
        SessionEvent::SessionReset {
            at: self.clock.now(),
        }
    }

    /// Swap in a fresh plan snapshot mid-session. The plan is re-validated,
    /// the navigator is clamped into it, completion marks are reconciled,
    /// and an active set that no longer exists is dropped together with its
    /// phase.
    pub fn replace_plan(&mut self, plan: SessionPlan) -> Result<SessionEvent, PlanError> {
        plan.validate()?;
        self.plan = plan;
        self.navigator.clamp_to(&self.plan);
        self.completed.reconcile(&self.plan);

        let still_valid = self.active_set.is_some_and(|set| {
            self.plan.set(set.section, set.exercise, set.set).is_some()
        });
        if !still_valid {
            self.active_set = None;
            self.phase = None;
        }

        Ok(SessionEvent::PlanReplaced {
            sections: self.plan.section_count(),
            total_sets: self.plan.total_sets(),
            at: self.clock.now(),
        })
    }

    /// End the session. Produces the summary for the recorder and clears
    /// the duration tracker; the caller is expected to discard the engine
    /// afterwards.
    pub fn finish(
        &mut self,
        feedback: SessionFeedback,
    ) -> Result<(SessionSummary, SessionEvent), SessionError> {
        let started_at = self.duration.started_at().ok_or(SessionError::NotStarted)?;
        let ended_at = self.clock.now();

        let summary = SessionSummary::build(
            &self.plan,
            &self.completed,
            self.session_id,
            started_at,
            ended_at,
            feedback,
        );
        self.phase = None;
        self.duration.clear();

        let event = SessionEvent::SessionFinished {
            session_id: summary.session_id.to_string(),
            duration_min: summary.duration_min,
            sets_completed: summary.sets_completed,
            sets_total: summary.sets_total,
            at: ended_at,
        };
        Ok((summary, event))
    }

    /// Reload path: re-adopt a persisted start instant (last write wins).
    pub fn restore_started_at(&mut self, instant: chrono::DateTime<chrono::Utc>) {
        self.duration.restore(instant);
    }

    // === Internal ===

    /// Start the duration tracker on the first phase start.
    fn begin_if_needed(&mut self) -> Vec<SessionEvent> {
        if self.duration.is_started() {
            return Vec::new();
        }
        match self.duration.begin(self.clock.now()) {
            Ok(at) => vec![SessionEvent::SessionBegan {
                session_id: self.session_id.to_string(),
                at,
            }],
            Err(_) => Vec::new(),
        }
    }

    /// Arm and start a phase timer. Callers clear `self.phase` first.
    fn arm_phase(&mut self, kind: Phase, duration_secs: u32) -> SessionEvent {
        let mut timer = PhaseTimer::new(duration_secs).with_countdown_cues(self.countdown_cue_secs);
        let now_ms = self.clock.now_ms();
        // Fresh Idle timer: start cannot fail.
        let _ = timer.start(now_ms);
        let armed_generation = timer.generation();
        self.phase = Some(ActivePhase {
            kind,
            timer,
            armed_generation,
        });
        SessionEvent::PhaseStarted {
            phase: kind,
            duration_secs,
            at: self.clock.now(),
        }
    }

    /// Handle a live completion signal for `kind`.
    fn complete_phase(&mut self, kind: Phase) -> Vec<SessionEvent> {
        let at = self.clock.now();
        match kind {
            Phase::Preparing => {
                // Preparation rolls straight into work.
                self.cues.play(CueId::Go);
                self.phase = None;
                let mut events = vec![SessionEvent::PhaseCompleted {
                    phase: Phase::Preparing,
                    at,
                }];
                let work_secs = self
                    .active_set
                    .and_then(|set| self.plan.set(set.section, set.exercise, set.set))
                    .and_then(SetSpec::work_secs);
                if let Some(work_secs) = work_secs {
                    self.has_started_work = true;
                    events.push(self.arm_phase(Phase::Working, work_secs));
                }
                events
            }
            Phase::Working => {
                // Completion of the timer, not of the set: marking the set
                // done stays a user action.
                self.cues.play(CueId::Work);
                self.phase = None;
                vec![SessionEvent::PhaseCompleted {
                    phase: Phase::Working,
                    at,
                }]
            }
            Phase::Resting => {
                self.cues.play(CueId::Rest);
                self.phase = None;
                vec![SessionEvent::PhaseCompleted {
                    phase: Phase::Resting,
                    at,
                }]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::cue::MemorySink;
    use std::sync::Arc;

    fn session() -> (WorkoutSession, Arc<ManualClock>, Arc<MemorySink>) {
        let clock = Arc::new(ManualClock::default());
        let sink = Arc::new(MemorySink::default());
        let mut cues = CuePlayer::default();
        cues.set_sink(sink.clone());
        let session = WorkoutSession::new(SessionPlan::sample())
            .with_clock(clock.clone())
            .with_cues(cues);
        (session, clock, sink)
    }

    fn timed_set() -> SetRef {
        // Warm-up / Jumping Jacks: 45s work, 15s rest.
        SetRef {
            section: 0,
            exercise: 0,
            set: 0,
        }
    }

    fn rep_set() -> SetRef {
        // Strength / Goblet Squat: reps with 90s rest.
        SetRef {
            section: 1,
            exercise: 0,
            set: 0,
        }
    }

    #[test]
    fn first_work_start_goes_through_preparation() {
        let (mut session, _clock, _sink) = session();
        session.select_set(timed_set()).unwrap();

        let events = session.start_work();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), "SessionBegan");
        assert!(matches!(
            events[1],
            SessionEvent::PhaseStarted {
                phase: Phase::Preparing,
                duration_secs: 5,
                ..
            }
        ));
        assert_eq!(session.phase(), Some(Phase::Preparing));
        assert!(!session.has_started_work());
    }

    #[test]
    fn preparation_completion_rolls_into_work() {
        let (mut session, clock, sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();

        clock.advance_secs(5);
        let events = session.tick();
        let kinds: Vec<_> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, ["PhaseCompleted", "PhaseStarted"]);
        assert!(matches!(
            events[1],
            SessionEvent::PhaseStarted {
                phase: Phase::Working,
                duration_secs: 45,
                ..
            }
        ));
        assert!(session.has_started_work());
        assert_eq!(sink.played(), vec![CueId::Go]);
    }

    #[test]
    fn work_completion_cues_but_does_not_mark_the_set() {
        let (mut session, clock, sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(5);
        session.tick();
        sink.clear();

        clock.advance_secs(45);
        let events = session.tick();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SessionEvent::PhaseCompleted {
                phase: Phase::Working,
                ..
            }
        ));
        assert_eq!(session.phase(), None);
        assert_eq!(sink.played(), vec![CueId::Work]);
        assert!(!session.is_set_done(timed_set()));
    }

    #[test]
    fn second_activation_skips_preparation() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(5);
        session.tick();
        clock.advance_secs(45);
        session.tick();

        let next = SetRef {
            section: 0,
            exercise: 0,
            set: 1,
        };
        session.select_set(next).unwrap();
        let events = session.start_work();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SessionEvent::PhaseStarted {
                phase: Phase::Working,
                ..
            }
        ));
    }

    #[test]
    fn reset_all_rearms_preparation() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(5);
        session.tick();
        assert!(session.has_started_work());

        session.reset_all();
        assert!(!session.has_started_work());
        assert_eq!(session.active_set(), None);
        assert_eq!(session.phase(), None);

        session.select_set(timed_set()).unwrap();
        let events = session.start_work();
        assert!(matches!(
            events.last().unwrap(),
            SessionEvent::PhaseStarted {
                phase: Phase::Preparing,
                ..
            }
        ));
    }

    #[test]
    fn aborted_preparation_does_not_latch() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(2);
        session.tick();

        // Switching sets mid-preparation halts it before work ever began.
        session
            .select_set(SetRef {
                section: 0,
                exercise: 0,
                set: 1,
            })
            .unwrap();
        assert_eq!(session.phase(), None);
        assert!(!session.has_started_work());

        // So the next start prepares again.
        let events = session.start_work();
        assert!(matches!(
            events.last().unwrap(),
            SessionEvent::PhaseStarted {
                phase: Phase::Preparing,
                ..
            }
        ));
    }

    #[test]
    fn rep_set_has_no_work_timer() {
        let (mut session, _clock, _sink) = session();
        session.select_set(rep_set()).unwrap();
        assert!(session.start_work().is_empty());
        assert_eq!(session.phase(), None);

        let events = session.start_rest();
        assert!(matches!(
            events.last().unwrap(),
            SessionEvent::PhaseStarted {
                phase: Phase::Resting,
                duration_secs: 90,
                ..
            }
        ));
    }

    #[test]
    fn starting_work_cancels_active_rest() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(5);
        session.tick();
        clock.advance_secs(45);
        session.tick();

        session.start_rest();
        assert_eq!(session.phase(), Some(Phase::Resting));

        clock.advance_secs(3);
        session.tick();
        let events = session.start_work();
        // No completion for the cancelled rest, just the new phase.
        assert_eq!(events.len(), 1);
        assert_eq!(session.phase(), Some(Phase::Working));

        // The rest timer's completion never arrives.
        clock.advance_secs(13);
        let events = session.tick();
        for event in &events {
            assert_ne!(event.kind(), "PhaseCompleted");
        }
    }

    #[test]
    fn mutual_exclusion_is_structural() {
        let (mut session, _clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        for _ in 0..5 {
            session.start_work();
            assert!(session.phase().is_some());
            session.start_rest();
            assert_eq!(session.phase(), Some(Phase::Resting));
        }
    }

    #[test]
    fn completion_fires_exactly_once() {
        let (mut session, clock, sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(5);
        session.tick();
        sink.clear();

        clock.advance_secs(60);
        let first = session.tick();
        assert_eq!(first.len(), 1);

        for _ in 0..10 {
            clock.advance_secs(1);
            assert!(session.tick().is_empty());
        }
        assert_eq!(sink.played(), vec![CueId::Work]);
    }

    #[test]
    fn countdown_ticks_cue_near_zero() {
        let (mut session, clock, sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();

        // Prep is 5s with cues from 3: expect ticks at 3, 2, 1.
        let mut countdowns = Vec::new();
        for _ in 0..4 {
            clock.advance_secs(1);
            for event in session.tick() {
                if let SessionEvent::CountdownTick { remaining_secs, .. } = event {
                    countdowns.push(remaining_secs);
                }
            }
        }
        assert_eq!(countdowns, vec![3, 2, 1]);
        assert_eq!(sink.played(), vec![CueId::Tick, CueId::Tick, CueId::Tick]);
    }

    #[test]
    fn pause_and_resume_report_remaining() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(2);
        session.tick();

        let paused = session.pause_phase().unwrap();
        assert!(matches!(
            paused,
            SessionEvent::PhasePaused {
                phase: Phase::Preparing,
                remaining_ms: 3_000,
                ..
            }
        ));

        // Paused time stands still.
        clock.advance_secs(60);
        assert!(session.tick().is_empty());

        let resumed = session.resume_phase().unwrap();
        assert!(matches!(
            resumed,
            SessionEvent::PhaseResumed {
                remaining_ms: 3_000,
                ..
            }
        ));
        assert!(session.pause_phase().is_some());
        assert!(session.resume_phase().is_some());
    }

    #[test]
    fn pause_without_phase_is_noop() {
        let (mut session, _clock, _sink) = session();
        assert!(session.pause_phase().is_none());
        assert!(session.resume_phase().is_none());
    }

    #[test]
    fn toggle_completion_is_phase_independent() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(1);
        session.tick();

        let other = SetRef {
            section: 2,
            exercise: 0,
            set: 1,
        };
        let event = session.toggle_set_completion(other).unwrap();
        assert!(matches!(
            event,
            SessionEvent::SetCompletionToggled {
                completed: true,
                ..
            }
        ));
        assert!(session.is_set_done(other));
        // Still preparing, untouched.
        assert_eq!(session.phase(), Some(Phase::Preparing));

        let err = session
            .toggle_set_completion(SetRef {
                section: 0,
                exercise: 0,
                set: 99,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidPosition { .. }));
    }

    #[test]
    fn select_set_validates_and_halts() {
        let (mut session, _clock, _sink) = session();
        let err = session
            .select_set(SetRef {
                section: 0,
                exercise: 7,
                set: 0,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidPosition { .. }));

        session.select_set(timed_set()).unwrap();
        session.start_work();
        assert!(session.phase().is_some());
        session.select_set(timed_set()).unwrap();
        assert!(session.phase().is_none());
    }

    #[test]
    fn replace_plan_drops_invalid_active_set() {
        let (mut session, clock, _sink) = session();
        let plank = SetRef {
            section: 2,
            exercise: 0,
            set: 0,
        };
        session.select_set(plank).unwrap();
        session.start_work();
        clock.advance_secs(1);
        session.tick();

        // New plan without the Core section.
        let full = SessionPlan::sample();
        let smaller = SessionPlan::new(full.sections[..2].to_vec()).unwrap();
        let event = session.replace_plan(smaller).unwrap();
        assert!(matches!(event, SessionEvent::PlanReplaced { sections: 2, .. }));
        assert_eq!(session.active_set(), None);
        assert_eq!(session.phase(), None);
        assert!(session.position().section <= 1);
    }

    #[test]
    fn replace_plan_keeps_surviving_state() {
        let (mut session, _clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.toggle_set_completion(timed_set()).unwrap();
        session.start_work();

        let event = session.replace_plan(SessionPlan::sample()).unwrap();
        assert!(matches!(event, SessionEvent::PlanReplaced { .. }));
        assert_eq!(session.active_set(), Some(timed_set()));
        assert!(session.phase().is_some());
        assert!(session.is_set_done(timed_set()));
    }

    #[test]
    fn finish_requires_a_started_session() {
        let (mut session, _clock, _sink) = session();
        let err = session.finish(SessionFeedback::default()).unwrap_err();
        assert!(matches!(err, SessionError::NotStarted));
    }

    #[test]
    fn finish_builds_summary_and_clears_duration() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        session.toggle_set_completion(timed_set()).unwrap();

        clock.advance_secs(31 * 60);
        let (summary, event) = session.finish(SessionFeedback::default()).unwrap();
        assert_eq!(summary.duration_min, 31);
        assert_eq!(summary.sets_completed, 1);
        assert_eq!(summary.sets_total, 11);
        assert!(matches!(
            event,
            SessionEvent::SessionFinished { duration_min: 31, .. }
        ));
        assert_eq!(session.elapsed_secs(), None);
        assert_eq!(session.phase(), None);
    }

    #[test]
    fn engine_round_trips_through_json_mid_phase() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(5);
        session.tick();
        clock.advance_secs(10);
        session.tick();

        let json = serde_json::to_string(&session).unwrap();
        let mut restored: WorkoutSession = serde_json::from_str(&json).unwrap();
        restored.set_clock(clock.clone());

        assert_eq!(restored.phase(), Some(Phase::Working));
        assert_eq!(restored.remaining_ms(), 35_000);
        assert_eq!(restored.active_set(), Some(timed_set()));
        assert!(restored.has_started_work());

        // The restored timer catches up against wall clock.
        clock.advance_secs(40);
        let events = restored.tick();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::PhaseCompleted { phase: Phase::Working, .. })));
    }

    #[test]
    fn snapshot_reports_full_state() {
        let (mut session, clock, _sink) = session();
        session.select_set(timed_set()).unwrap();
        session.start_work();
        clock.advance_secs(2);
        session.tick();

        let SessionEvent::StateSnapshot {
            phase,
            timer_state,
            remaining_ms,
            exercise,
            active_set,
            completed_sets,
            total_sets,
            has_started_work,
            ..
        } = session.snapshot()
        else {
            panic!("snapshot must be a StateSnapshot");
        };
        assert_eq!(phase, Some(Phase::Preparing));
        assert_eq!(timer_state, TimerState::Running);
        assert_eq!(remaining_ms, 3_000);
        assert_eq!(exercise, "Jumping Jacks");
        assert_eq!(active_set, Some(timed_set()));
        assert_eq!(completed_sets, 0);
        assert_eq!(total_sets, 11);
        assert!(!has_started_work);
    }

    #[test]
    fn zero_prep_goes_straight_to_work() {
        let (mut session, _clock, _sink) = session();
        session.set_timing(0, 3);
        session.select_set(timed_set()).unwrap();

        let events = session.start_work();
        assert!(matches!(
            events.last().unwrap(),
            SessionEvent::PhaseStarted {
                phase: Phase::Working,
                ..
            }
        ));
        assert!(session.has_started_work());
    }

    #[test]
    fn zero_rest_completes_on_next_tick() {
        let (mut session, clock, _sink) = session();
        let mut plan = SessionPlan::sample();
        plan.sections[0].exercises[0].sets = vec![SetSpec::Timed {
            work_secs: 20,
            rest_secs: 0,
        }];
        session.replace_plan(plan).unwrap();

        session.select_set(timed_set()).unwrap();
        session.start_rest();
        assert_eq!(session.phase(), Some(Phase::Resting));
        clock.advance_secs(0);
        let events = session.tick();
        assert!(matches!(
            events[0],
            SessionEvent::PhaseCompleted {
                phase: Phase::Resting,
                ..
            }
        ));
    }
}
