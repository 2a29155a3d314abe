//! Position tracking within a session plan.
//!
//! The navigator owns the `(section, exercise)` pointer and nothing else;
//! the plan itself is passed in by the engine. Section transitions are
//! explicit user actions: advancing past the last exercise of a section
//! parks the pointer one past the end instead of rolling into the next
//! section, and `current` reports `None` there.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::plan::{Exercise, Section, SessionPlan};

/// The `(section, exercise)` pointer identifying the presented exercise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPosition {
    pub section: usize,
    pub exercise: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigator {
    position: PlanPosition,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> PlanPosition {
        self.position
    }

    pub fn current_section<'a>(&self, plan: &'a SessionPlan) -> Option<&'a Section> {
        plan.section(self.position.section)
    }

    /// The exercise under the pointer, or `None` past the section's end.
    pub fn current<'a>(&self, plan: &'a SessionPlan) -> Option<&'a Exercise> {
        plan.exercise(self.position.section, self.position.exercise)
    }

    /// Exercises after the pointer in the current section. Display only.
    pub fn upcoming<'a>(&self, plan: &'a SessionPlan) -> &'a [Exercise] {
        let Some(section) = self.current_section(plan) else {
            return &[];
        };
        let from = (self.position.exercise + 1).min(section.exercises.len());
        &section.exercises[from..]
    }

    /// Exercises before the pointer in the current section. Display only.
    pub fn previous<'a>(&self, plan: &'a SessionPlan) -> &'a [Exercise] {
        let Some(section) = self.current_section(plan) else {
            return &[];
        };
        let to = self.position.exercise.min(section.exercises.len());
        &section.exercises[..to]
    }

    /// Move forward within the section, saturating one past the last
    /// exercise. Never rolls into the next section.
    pub fn advance_exercise(&mut self, plan: &SessionPlan) {
        let Some(section) = self.current_section(plan) else {
            return;
        };
        let past_end = section.exercises.len();
        self.position.exercise = (self.position.exercise + 1).min(past_end);
    }

    /// Move to the next section, clamped to the last one. Resets the
    /// exercise pointer when the section actually changes.
    pub fn advance_section(&mut self, plan: &SessionPlan) {
        let last = plan.section_count().saturating_sub(1);
        let next = (self.position.section + 1).min(last);
        if next != self.position.section {
            self.position = PlanPosition {
                section: next,
                exercise: 0,
            };
        }
    }

    /// Move to the previous section, clamped to the first one.
    pub fn retreat_section(&mut self, plan: &SessionPlan) {
        let prev = self.position.section.saturating_sub(1);
        if prev != self.position.section {
            self.position = PlanPosition {
                section: prev,
                exercise: 0,
            };
        }
    }

    /// Direct jump to an exercise in the current section (tapping an
    /// upcoming/previous card).
    pub fn jump_to_exercise(
        &mut self,
        plan: &SessionPlan,
        index: usize,
    ) -> Result<(), SessionError> {
        let section = self
            .current_section(plan)
            .ok_or(SessionError::InvalidPosition {
                section: self.position.section,
                exercise: index,
                set: 0,
            })?;
        if index >= section.exercises.len() {
            return Err(SessionError::InvalidPosition {
                section: self.position.section,
                exercise: index,
                set: 0,
            });
        }
        self.position.exercise = index;
        Ok(())
    }

    /// Clamp the pointer into a (possibly different) plan after an
    /// in-session edit. The exercise pointer keeps its past-the-end parking
    /// spot if it had one.
    pub fn clamp_to(&mut self, plan: &SessionPlan) {
        let last_section = plan.section_count().saturating_sub(1);
        if self.position.section > last_section {
            self.position = PlanPosition {
                section: last_section,
                exercise: 0,
            };
        }
        if let Some(section) = plan.section(self.position.section) {
            let past_end = section.exercises.len();
            self.position.exercise = self.position.exercise.min(past_end);
        }
    }
}
