use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use repflow_core::cue::render;
use repflow_core::storage::Config;
use repflow_core::{CueError, CueId, CuePlayer, CueSink};

/// Terminal sink. Renders nothing audible beyond the bell character; the
/// PCM a real audio backend would receive is dropped after logging.
pub struct BellSink;

impl CueSink for BellSink {
    fn play(&self, cue: CueId, samples: &[f32]) -> Result<(), CueError> {
        tracing::debug!(cue = cue.as_str(), samples = samples.len(), "cue");
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum CueAction {
    /// List cue definitions
    List,
    /// Render a cue and ring the terminal bell
    Test {
        /// Cue name
        #[arg(value_parser = ["work", "rest", "tick", "go"])]
        name: String,
    },
}

pub fn run(action: CueAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CueAction::List => {
            let rows: Vec<_> = CueId::all()
                .into_iter()
                .map(|id| {
                    let spec = id.spec();
                    serde_json::json!({
                        "id": id.as_str(),
                        "duration_ms": spec.total_duration_ms(),
                        "segments": spec.segments.len(),
                        "vibrates": !spec.vibration_ms.is_empty(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        CueAction::Test { name } => {
            let id = CueId::all()
                .into_iter()
                .find(|id| id.as_str() == name)
                .ok_or_else(|| format!("unknown cue: {name}"))?;
            let config = Config::load()?;
            let player = CuePlayer::with_sink(Arc::new(BellSink), config.cues);
            player.play(id);

            let spec = id.spec();
            let samples = render(&spec, config.cues.volume.min(100) as f32 / 100.0);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "id": id.as_str(),
                    "duration_ms": spec.total_duration_ms(),
                    "samples": samples.len(),
                    "enabled": config.cues.enabled,
                }))?
            );
        }
    }
    Ok(())
}
