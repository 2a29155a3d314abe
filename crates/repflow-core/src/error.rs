//! Core error types for repflow-core.
//!
//! This module defines the error hierarchy using thiserror. Expected edge
//! cases (no active set, navigation past the end of a section) are not
//! errors; they surface as `None` / empty event lists at the call sites.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for repflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session plan validation errors
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Session/engine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Cue playback errors
    #[error("Cue error: {0}")]
    Cue(#[from] CueError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors raised while validating a session plan at construction time.
///
/// A plan that violates the data-model invariants is a programmer/collaborator
/// error and fails loudly here instead of misbehaving mid-session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// The plan has no sections at all
    #[error("Plan has no sections")]
    NoSections,

    /// A section has no exercises
    #[error("Section '{section}' has no exercises")]
    EmptySection { section: String },

    /// An exercise has no sets
    #[error("Exercise '{exercise}' has no sets")]
    NoSets { exercise: String },

    /// Timed and rep-based sets mixed within one exercise
    #[error("Exercise '{exercise}' mixes timed and rep-based sets")]
    MixedSetKinds { exercise: String },

    /// A timed set with a zero work duration
    #[error("Exercise '{exercise}' set {set_index} has a zero work duration")]
    ZeroWorkDuration { exercise: String, set_index: usize },

    /// A rep-based set with a negative weight
    #[error("Exercise '{exercise}' set {set_index} has a negative weight")]
    NegativeWeight { exercise: String, set_index: usize },

    /// The plan JSON could not be parsed at all
    #[error("Malformed plan: {0}")]
    Malformed(String),
}

/// Errors raised by the session engine and navigator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An index pointed outside the current plan
    #[error("Position out of range: section {section}, exercise {exercise}, set {set}")]
    InvalidPosition {
        section: usize,
        exercise: usize,
        set: usize,
    },

    /// A timer operation was not valid in the current state
    #[error("Invalid timer transition: {0}")]
    InvalidTransition(&'static str),

    /// The duration tracker was already started
    #[error("Session already started at {started_at}")]
    AlreadyStarted { started_at: chrono::DateTime<chrono::Utc> },

    /// Finish was requested before the session ever began
    #[error("Session was never started")]
    NotStarted,
}

/// Cue playback errors. Always swallowed and logged by the `CuePlayer`;
/// they exist so sinks can report what went wrong.
#[derive(Error, Debug, Clone)]
pub enum CueError {
    /// Audio/haptic backend missing or refused playback
    #[error("Cue backend unavailable: {0}")]
    Unavailable(String),

    /// The sink rejected the rendered cue
    #[error("Cue playback failed: {0}")]
    PlaybackFailed(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDirUnavailable(String),

    /// A persisted value could not be parsed
    #[error("Corrupt persisted value for '{key}': {message}")]
    CorruptValue { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown or malformed dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
