//! SQLite-based workout storage and statistics.
//!
//! Provides persistent storage for:
//! - Finished workout sessions (summary rows plus the full summary JSON)
//! - Workout statistics (daily and all-time)
//! - Key-value store for in-flight session state
//!
//! The kv store carries the live-session contract: `session_started_at`
//! holds the wall-clock start instant as RFC 3339 (epoch milliseconds are
//! also accepted on read, older builds wrote that), and `session_engine`
//! holds the serialized engine so a new process can pick the session back
//! up mid-phase.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::session::{SessionSummary, WorkoutSession};

use super::data_dir;

/// Start instant of the in-flight session.
pub const KV_SESSION_STARTED_AT: &str = "session_started_at";
/// Serialized engine state of the in-flight session.
pub const KV_SESSION_ENGINE: &str = "session_engine";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: i64,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_min: u64,
    pub sets_completed: u64,
    pub sets_total: u64,
    pub rating: Option<u8>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_workouts: u64,
    pub total_min: u64,
    pub total_sets: u64,
    pub today_workouts: u64,
    pub today_min: u64,
    pub today_sets: u64,
}

/// SQLite database for workout storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/repflow/repflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(data_dir()?.join("repflow.db"))
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let conn = Connection::open(&path)
            .map_err(|source| StorageError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, throwaway consumers).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS workouts (
                    id             INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id     TEXT NOT NULL,
                    started_at     TEXT NOT NULL,
                    ended_at       TEXT NOT NULL,
                    duration_min   INTEGER NOT NULL,
                    sets_completed INTEGER NOT NULL,
                    sets_total     INTEGER NOT NULL,
                    rating         INTEGER,
                    notes          TEXT,
                    summary        TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_workouts_ended_at ON workouts(ended_at);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a finished workout.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_workout(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let json = serde_json::to_string(summary).map_err(|e| StorageError::CorruptValue {
            key: "summary".into(),
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT INTO workouts
                 (session_id, started_at, ended_at, duration_min,
                  sets_completed, sets_total, rating, notes, summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                summary.session_id.to_string(),
                summary.started_at.to_rfc3339(),
                summary.ended_at.to_rfc3339(),
                summary.duration_min,
                summary.sets_completed as u64,
                summary.sets_total as u64,
                summary.feedback.rating,
                summary.feedback.notes,
                json,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The most recent workouts, newest first.
    pub fn recent_workouts(&self, limit: u32) -> Result<Vec<WorkoutRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, started_at, ended_at, duration_min,
                    sets_completed, sets_total, rating, notes
             FROM workouts
             ORDER BY ended_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u64>(4)?,
                row.get::<_, u64>(5)?,
                row.get::<_, u64>(6)?,
                row.get::<_, Option<u8>>(7)?,
                row.get::<_, Option<String>>(8)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, session_id, started_at, ended_at, duration_min, done, total, rating, notes) =
                row?;
            records.push(WorkoutRecord {
                id,
                session_id,
                started_at: parse_instant("workouts.started_at", &started_at)?,
                ended_at: parse_instant("workouts.ended_at", &ended_at)?,
                duration_min,
                sets_completed: done,
                sets_total: total,
                rating,
                notes,
            });
        }
        Ok(records)
    }

    pub fn stats_today(&self) -> Result<Stats, StorageError> {
        let midnight = Utc::now().format("%Y-%m-%dT00:00:00+00:00").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0), COALESCE(SUM(sets_completed), 0)
             FROM workouts
             WHERE ended_at >= ?1",
        )?;
        let (count, minutes, sets) = stmt.query_row(params![midnight], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;
        Ok(Stats {
            total_workouts: count,
            total_min: minutes,
            total_sets: sets,
            today_workouts: count,
            today_min: minutes,
            today_sets: sets,
        })
    }

    pub fn stats_all(&self) -> Result<Stats, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0), COALESCE(SUM(sets_completed), 0)
             FROM workouts",
        )?;
        let (count, minutes, sets) = stmt.query_row([], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let today = self.stats_today()?;
        Ok(Stats {
            total_workouts: count,
            total_min: minutes,
            total_sets: sets,
            today_workouts: today.today_workouts,
            today_min: today.today_min,
            today_sets: today.today_sets,
        })
    }

    // === Key-value store ===

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store. Last write wins.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are fine.
    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // === In-flight session state ===

    pub fn save_session_start(&self, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.kv_set(KV_SESSION_STARTED_AT, &at.to_rfc3339())
    }

    /// Load the persisted session start, if any. RFC 3339 is canonical;
    /// a bare integer is read as epoch milliseconds.
    pub fn load_session_start(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        match self.kv_get(KV_SESSION_STARTED_AT)? {
            None => Ok(None),
            Some(raw) => parse_instant(KV_SESSION_STARTED_AT, &raw).map(Some),
        }
    }

    pub fn clear_session_start(&self) -> Result<(), StorageError> {
        self.kv_delete(KV_SESSION_STARTED_AT)
    }

    pub fn save_engine(&self, session: &WorkoutSession) -> Result<(), StorageError> {
        let json = serde_json::to_string(session).map_err(|e| StorageError::CorruptValue {
            key: KV_SESSION_ENGINE.into(),
            message: e.to_string(),
        })?;
        self.kv_set(KV_SESSION_ENGINE, &json)
    }

    /// Load the persisted engine, if any. The caller re-attaches the clock
    /// and cue player afterwards.
    pub fn load_engine(&self) -> Result<Option<WorkoutSession>, StorageError> {
        match self.kv_get(KV_SESSION_ENGINE)? {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StorageError::CorruptValue {
                    key: KV_SESSION_ENGINE.into(),
                    message: e.to_string(),
                }),
        }
    }

    pub fn clear_engine(&self) -> Result<(), StorageError> {
        self.kv_delete(KV_SESSION_ENGINE)
    }
}

/// Parse a persisted instant: RFC 3339, or epoch milliseconds as fallback.
fn parse_instant(key: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(millis) = raw.parse::<i64>() {
        if let Some(parsed) = DateTime::from_timestamp_millis(millis) {
            return Ok(parsed);
        }
    }
    Err(StorageError::CorruptValue {
        key: key.into(),
        message: format!("not a timestamp: {raw}"),
    })
}
