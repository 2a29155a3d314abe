mod config;
pub mod database;

pub use config::{Config, SessionConfig};
pub use database::{Database, Stats, WorkoutRecord, KV_SESSION_ENGINE, KV_SESSION_STARTED_AT};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/repflow[-dev]/` based on REPFLOW_ENV.
///
/// `REPFLOW_DATA_DIR` overrides the location entirely (tests, portable
/// installs). Set `REPFLOW_ENV=dev` to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var("REPFLOW_DATA_DIR") {
        Ok(custom) => PathBuf::from(custom),
        Err(_) => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("REPFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("repflow-dev")
            } else {
                base_dir.join("repflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
