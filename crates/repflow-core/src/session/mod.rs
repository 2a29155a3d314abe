//! Session state: navigation, the phase engine and completion tracking.

mod engine;
mod navigator;
mod summary;

pub use engine::{
    Phase, SetRef, WorkoutSession, DEFAULT_COUNTDOWN_CUE_SECS, DEFAULT_PREP_SECS,
};
pub use navigator::{Navigator, PlanPosition};
pub use summary::{
    CompletionLog, ExerciseCompletion, ExerciseSummary, SessionFeedback, SessionSummary,
};
