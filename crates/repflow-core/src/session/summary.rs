//! Per-set completion tracking and the end-of-session summary.
//!
//! Completion is a flat log keyed by `(section, exercise)` with one bool
//! per set. Entries are created lazily on the first toggle so an untouched
//! plan serializes small. The summary is the value handed to the recorder
//! when a session finishes; it owns names copied out of the plan so it
//! stays meaningful after the plan itself is edited or replaced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::plan::SessionPlan;

/// Completion marks for one exercise, one flag per set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseCompletion {
    pub section: usize,
    pub exercise: usize,
    pub sets: Vec<bool>,
}

/// All completion marks for the running session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLog {
    entries: Vec<ExerciseCompletion>,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, section: usize, exercise: usize) -> Option<&ExerciseCompletion> {
        self.entries
            .iter()
            .find(|e| e.section == section && e.exercise == exercise)
    }

    /// Flip one set's mark, creating the exercise entry on first touch.
    /// Returns the new state of the flag.
    pub fn toggle(
        &mut self,
        plan: &SessionPlan,
        section: usize,
        exercise: usize,
        set: usize,
    ) -> Result<bool, SessionError> {
        let ex = plan
            .exercise(section, exercise)
            .ok_or(SessionError::InvalidPosition {
                section,
                exercise,
                set,
            })?;
        if set >= ex.set_count() {
            return Err(SessionError::InvalidPosition {
                section,
                exercise,
                set,
            });
        }

        let idx = match self
            .entries
            .iter()
            .position(|e| e.section == section && e.exercise == exercise)
        {
            Some(idx) => idx,
            None => {
                self.entries.push(ExerciseCompletion {
                    section,
                    exercise,
                    sets: vec![false; ex.set_count()],
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[idx];
        entry.sets[set] = !entry.sets[set];
        Ok(entry.sets[set])
    }

    pub fn is_done(&self, section: usize, exercise: usize, set: usize) -> bool {
        self.entry(section, exercise)
            .and_then(|e| e.sets.get(set).copied())
            .unwrap_or(false)
    }

    /// Count of sets marked done across the whole log.
    pub fn completed_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.sets.iter().filter(|done| **done).count())
            .sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reshape the log after a plan edit: entries pointing outside the new
    /// plan are dropped, surviving set vectors are resized (new sets start
    /// unmarked, removed sets lose their marks).
    pub fn reconcile(&mut self, plan: &SessionPlan) {
        self.entries.retain_mut(|entry| {
            let Some(ex) = plan.exercise(entry.section, entry.exercise) else {
                return false;
            };
            entry.sets.resize(ex.set_count(), false);
            true
        });
    }
}

/// Optional rating and notes collected on finish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Per-exercise completion line in the summary, with names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub section: String,
    pub exercise: String,
    pub sets_completed: usize,
    pub sets_total: usize,
}

/// The record handed to storage when a session finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_min: u64,
    pub sets_completed: usize,
    pub sets_total: usize,
    pub exercises: Vec<ExerciseSummary>,
    #[serde(default)]
    pub feedback: SessionFeedback,
}

impl SessionSummary {
    pub fn build(
        plan: &SessionPlan,
        log: &CompletionLog,
        session_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        feedback: SessionFeedback,
    ) -> Self {
        let mut exercises = Vec::new();
        for (si, section) in plan.sections.iter().enumerate() {
            for (ei, ex) in section.exercises.iter().enumerate() {
                let done = log
                    .entry(si, ei)
                    .map(|e| e.sets.iter().filter(|d| **d).count())
                    .unwrap_or(0);
                exercises.push(ExerciseSummary {
                    section: section.name.clone(),
                    exercise: ex.name.clone(),
                    sets_completed: done,
                    sets_total: ex.set_count(),
                });
            }
        }
        let duration_min = (ended_at - started_at).num_minutes().max(0) as u64;
        Self {
            session_id,
            started_at,
            ended_at,
            duration_min,
            sets_completed: log.completed_count(),
            sets_total: plan.total_sets(),
            exercises,
            feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan() -> SessionPlan {
        SessionPlan::sample()
    }

    #[test]
    fn toggle_flips_and_reports() {
        let plan = plan();
        let mut log = CompletionLog::new();

        assert!(!log.is_done(0, 0, 1));
        assert!(log.toggle(&plan, 0, 0, 1).unwrap());
        assert!(log.is_done(0, 0, 1));
        assert_eq!(log.completed_count(), 1);

        assert!(!log.toggle(&plan, 0, 0, 1).unwrap());
        assert!(!log.is_done(0, 0, 1));
        assert_eq!(log.completed_count(), 0);
    }

    #[test]
    fn toggle_rejects_out_of_plan_positions() {
        let plan = plan();
        let mut log = CompletionLog::new();

        let err = log.toggle(&plan, 9, 0, 0).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPosition { section: 9, .. }));

        // Jumping Jacks has 2 sets.
        let err = log.toggle(&plan, 0, 0, 2).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPosition { set: 2, .. }));
    }

    #[test]
    fn untouched_exercises_have_no_entries() {
        let plan = plan();
        let mut log = CompletionLog::new();
        log.toggle(&plan, 1, 0, 0).unwrap();

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["entries"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn reconcile_drops_stale_and_resizes() {
        let plan = plan();
        let mut log = CompletionLog::new();
        log.toggle(&plan, 0, 0, 0).unwrap();
        log.toggle(&plan, 2, 0, 2).unwrap();

        // Keep only the warm-up section.
        let smaller = SessionPlan::new(vec![plan.sections[0].clone()]).unwrap();
        log.reconcile(&smaller);

        assert!(log.is_done(0, 0, 0));
        assert!(!log.is_done(2, 0, 2));
        assert_eq!(log.completed_count(), 1);
    }

    #[test]
    fn summary_counts_and_names() {
        let plan = plan();
        let mut log = CompletionLog::new();
        log.toggle(&plan, 0, 0, 0).unwrap();
        log.toggle(&plan, 0, 0, 1).unwrap();
        log.toggle(&plan, 1, 0, 0).unwrap();

        let started = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
        let ended = Utc.with_ymd_and_hms(2024, 3, 1, 7, 42, 30).unwrap();
        let summary = SessionSummary::build(
            &plan,
            &log,
            Uuid::new_v4(),
            started,
            ended,
            SessionFeedback {
                rating: Some(4),
                notes: None,
            },
        );

        assert_eq!(summary.duration_min, 42);
        assert_eq!(summary.sets_completed, 3);
        assert_eq!(summary.sets_total, plan.total_sets());
        assert_eq!(summary.exercises.len(), 5);

        let jacks = &summary.exercises[0];
        assert_eq!(jacks.section, "Warm-up");
        assert_eq!(jacks.exercise, "Jumping Jacks");
        assert_eq!(jacks.sets_completed, 2);
        assert_eq!(jacks.sets_total, 2);

        let pushup = summary
            .exercises
            .iter()
            .find(|e| e.exercise == "Push-up")
            .unwrap();
        assert_eq!(pushup.sets_completed, 0);
        assert_eq!(summary.feedback.rating, Some(4));
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let plan = plan();
        let log = CompletionLog::new();
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let ended = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
        let summary = SessionSummary::build(
            &plan,
            &log,
            Uuid::new_v4(),
            started,
            ended,
            SessionFeedback::default(),
        );
        assert_eq!(summary.duration_min, 0);
    }
}
