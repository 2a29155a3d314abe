use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use repflow_core::storage::{Config, Database};
use repflow_core::{
    CuePlayer, SessionEvent, SessionFeedback, SetRef, TimerState, WorkoutSession,
};

use super::cue::BellSink;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start the workout (selects the first set if none is active)
    Start,
    /// Select a set by position
    Select {
        section: usize,
        exercise: usize,
        set: usize,
    },
    /// Begin the work phase for the active set
    Work,
    /// Begin the rest phase for the active set
    Rest,
    /// Pause the running phase
    Pause,
    /// Resume a paused phase
    Resume,
    /// Advance to the next exercise in the section
    Next,
    /// Move to an adjacent section
    Section {
        /// Direction to move
        #[arg(value_parser = ["next", "prev"])]
        direction: String,
    },
    /// Jump to an exercise within the current section
    Jump { index: usize },
    /// Toggle a set's completion mark
    Complete {
        section: usize,
        exercise: usize,
        set: usize,
    },
    /// Print current session state as JSON
    Status,
    /// Drive the running phase in the foreground, printing events
    Watch,
    /// End the session and record the workout
    Finish {
        /// Rating from 1 to 5
        #[arg(long)]
        rating: Option<u8>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Clear the run state and re-arm the preparation countdown
    Reset,
}

fn load_session(db: &Database, config: &Config) -> WorkoutSession {
    let mut session = match db.load_engine() {
        Ok(Some(session)) => session,
        Ok(None) => WorkoutSession::new(config.plan()),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable session state");
            WorkoutSession::new(config.plan())
        }
    };
    // The kv start instant is the canonical copy; last write wins.
    if let Ok(Some(at)) = db.load_session_start() {
        session.restore_started_at(at);
    }
    session.set_timing(
        config.session.preparation_secs,
        config.session.countdown_cue_secs,
    );
    session.set_cues(CuePlayer::with_sink(Arc::new(BellSink), config.cues));
    session
}

fn save_session(db: &Database, session: &WorkoutSession) -> Result<(), Box<dyn std::error::Error>> {
    db.save_engine(session)?;
    if let Some(at) = session.started_at() {
        db.save_session_start(at)?;
    }
    Ok(())
}

fn print_event(event: &SessionEvent) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Commands that may legitimately produce no event fall back to a snapshot,
/// so every invocation prints something parseable.
fn print_events_or_snapshot(
    session: &WorkoutSession,
    events: &[SessionEvent],
) -> Result<(), Box<dyn std::error::Error>> {
    if events.is_empty() {
        print_event(&session.snapshot())
    } else {
        events.iter().try_for_each(print_event)
    }
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut session = load_session(&db, &config);

    match action {
        SessionAction::Start => {
            if session.active_set().is_none() {
                let event = session.select_set(SetRef {
                    section: 0,
                    exercise: 0,
                    set: 0,
                })?;
                print_event(&event)?;
            }
            let events = session.start_work();
            print_events_or_snapshot(&session, &events)?;
        }
        SessionAction::Select {
            section,
            exercise,
            set,
        } => {
            let event = session.select_set(SetRef {
                section,
                exercise,
                set,
            })?;
            print_event(&event)?;
        }
        SessionAction::Work => {
            let events = session.start_work();
            print_events_or_snapshot(&session, &events)?;
        }
        SessionAction::Rest => {
            let events = session.start_rest();
            print_events_or_snapshot(&session, &events)?;
        }
        SessionAction::Pause => match session.pause_phase() {
            Some(event) => print_event(&event)?,
            None => print_event(&session.snapshot())?,
        },
        SessionAction::Resume => match session.resume_phase() {
            Some(event) => print_event(&event)?,
            None => print_event(&session.snapshot())?,
        },
        SessionAction::Next => {
            let event = session.advance_exercise();
            print_event(&event)?;
        }
        SessionAction::Section { direction } => {
            let event = if direction == "prev" {
                session.retreat_section()
            } else {
                session.advance_section()
            };
            print_event(&event)?;
        }
        SessionAction::Jump { index } => {
            let event = session.jump_to_exercise(index)?;
            print_event(&event)?;
        }
        SessionAction::Complete {
            section,
            exercise,
            set,
        } => {
            let event = session.toggle_set_completion(SetRef {
                section,
                exercise,
                set,
            })?;
            print_event(&event)?;
        }
        SessionAction::Status => {
            // Tick first so the snapshot reflects wall-clock progress.
            let events = session.tick();
            print_event(&session.snapshot())?;
            events.iter().try_for_each(print_event)?;
        }
        SessionAction::Watch => {
            let interval = Duration::from_millis(config.session.tick_interval_ms.max(50));
            while session.phase().is_some() && session.timer_state() == TimerState::Running {
                let events = session.tick();
                events.iter().try_for_each(print_event)?;
                if !events.is_empty() {
                    save_session(&db, &session)?;
                }
                std::thread::sleep(interval);
            }
            print_event(&session.snapshot())?;
        }
        SessionAction::Finish { rating, notes } => {
            let (summary, _event) = session.finish(SessionFeedback { rating, notes })?;
            db.record_workout(&summary)?;
            db.clear_engine()?;
            db.clear_session_start()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            // The engine is spent; nothing left to persist.
            return Ok(());
        }
        SessionAction::Reset => {
            let event = session.reset_all();
            print_event(&event)?;
        }
    }

    save_session(&db, &session)?;
    Ok(())
}
