mod duration;
mod phase;

pub use duration::{format_hms, DurationTracker};
pub use phase::{PhaseTimer, TimerSignal, TimerState};
