//! Audio/haptic cue playback.
//!
//! The engine owns a [`CuePlayer`] and calls it at precise countdown
//! instants. Playback goes through the [`CueSink`] trait so the audio
//! backend stays a collaborator: the desktop shell brings a real output
//! device, the CLI rings the terminal bell, tests record cue ids. A player
//! without a sink is silent. Sink failures are swallowed and logged; a
//! session must keep running when audio is unavailable.

mod synth;

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::CueError;

pub use synth::{render, CueSpec, ToneSegment, Waveform, SAMPLE_RATE};

/// Identifier of a cue sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueId {
    /// Work countdown finished: ascending arpeggio fanfare.
    Work,
    /// Rest countdown finished: descending chime.
    Rest,
    /// Near-zero countdown beep.
    Tick,
    /// Preparation finished, work begins: rising blip.
    Go,
}

impl CueId {
    pub fn all() -> [CueId; 4] {
        [CueId::Work, CueId::Rest, CueId::Tick, CueId::Go]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CueId::Work => "work",
            CueId::Rest => "rest",
            CueId::Tick => "tick",
            CueId::Go => "go",
        }
    }

    pub fn spec(self) -> CueSpec {
        match self {
            CueId::Work => synth::WORK_SPEC,
            CueId::Rest => synth::REST_SPEC,
            CueId::Tick => synth::TICK_SPEC,
            CueId::Go => synth::GO_SPEC,
        }
    }
}

/// Cue playback preferences; the `[cues]` section of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 0-100.
    #[serde(default = "default_volume")]
    pub volume: u32,
    #[serde(default = "default_enabled")]
    pub vibration: bool,
}

fn default_enabled() -> bool {
    true
}
fn default_volume() -> u32 {
    50
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 50,
            vibration: true,
        }
    }
}

/// Where rendered cues go. Implementations must not block for the duration
/// of the sound: hand off and return.
pub trait CueSink: Send + Sync {
    /// Play rendered PCM (mono f32, [`SAMPLE_RATE`]).
    fn play(&self, cue: CueId, samples: &[f32]) -> Result<(), CueError>;

    /// Vibration pattern, alternating on/off milliseconds.
    fn vibrate(&self, _cue: CueId, _pattern_ms: &[u32]) -> Result<(), CueError> {
        Ok(()) // default no-op
    }
}

/// Renders cues and dispatches them to the attached sink.
#[derive(Clone, Default)]
pub struct CuePlayer {
    sink: Option<Arc<dyn CueSink>>,
    config: CueConfig,
}

impl CuePlayer {
    /// A player with no sink: every cue is a silent no-op.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Arc<dyn CueSink>, config: CueConfig) -> Self {
        Self {
            sink: Some(sink),
            config,
        }
    }

    pub fn set_sink(&mut self, sink: Arc<dyn CueSink>) {
        self.sink = Some(sink);
    }

    pub fn set_config(&mut self, config: CueConfig) {
        self.config = config;
    }

    pub fn config(&self) -> CueConfig {
        self.config
    }

    /// Play a cue. Never fails: missing backends and sink errors are
    /// swallowed here and logged at most.
    pub fn play(&self, cue: CueId) {
        if !self.config.enabled {
            return;
        }
        let Some(sink) = &self.sink else {
            tracing::debug!(cue = cue.as_str(), "no cue sink attached");
            return;
        };

        let spec = cue.spec();
        let samples = synth::render(&spec, self.config.volume.min(100) as f32 / 100.0);
        if let Err(e) = sink.play(cue, &samples) {
            tracing::warn!(cue = cue.as_str(), error = %e, "cue playback failed");
        }
        if self.config.vibration && !spec.vibration_ms.is_empty() {
            if let Err(e) = sink.vibrate(cue, spec.vibration_ms) {
                tracing::warn!(cue = cue.as_str(), error = %e, "vibration failed");
            }
        }
    }
}

impl fmt::Debug for CuePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CuePlayer")
            .field("sink", &self.sink.as_ref().map(|_| "attached"))
            .field("config", &self.config)
            .finish()
    }
}

/// Records cue ids instead of playing them. For tests and headless
/// consumers that only want to know what would have sounded.
#[derive(Debug, Default)]
pub struct MemorySink {
    played: Mutex<Vec<CueId>>,
    vibrated: Mutex<Vec<CueId>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<CueId> {
        self.played.lock().unwrap().clone()
    }

    pub fn vibrated(&self) -> Vec<CueId> {
        self.vibrated.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.played.lock().unwrap().clear();
        self.vibrated.lock().unwrap().clear();
    }
}

impl CueSink for MemorySink {
    fn play(&self, cue: CueId, _samples: &[f32]) -> Result<(), CueError> {
        self.played.lock().unwrap().push(cue);
        Ok(())
    }

    fn vibrate(&self, cue: CueId, _pattern_ms: &[u32]) -> Result<(), CueError> {
        self.vibrated.lock().unwrap().push(cue);
        Ok(())
    }
}
