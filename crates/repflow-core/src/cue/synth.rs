//! Cue waveform synthesis.
//!
//! Cues are rendered to raw PCM (44.1 kHz mono f32) from short tone
//! segments. Rendering is pure DSP with no audio backend; a
//! [`crate::cue::CueSink`] decides what to do with the samples. A short
//! linear attack/release envelope on every segment keeps the cues free of
//! boundary clicks.

use serde::{Deserialize, Serialize};

pub const SAMPLE_RATE: u32 = 44_100;

/// Envelope ramp length. Short enough to be inaudible as a fade, long
/// enough to remove the boundary click.
const RAMP_MS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// One constant-frequency tone within a cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSegment {
    pub freq_hz: f32,
    pub duration_ms: u32,
    pub waveform: Waveform,
}

/// The full recipe for a cue: its tone sequence and vibration pattern
/// (alternating on/off milliseconds, web-vibration style; empty = none).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueSpec {
    pub segments: &'static [ToneSegment],
    pub vibration_ms: &'static [u32],
}

impl CueSpec {
    pub fn total_duration_ms(&self) -> u32 {
        self.segments.iter().map(|s| s.duration_ms).sum()
    }
}

// Note frequencies, equal temperament.
const C5: f32 = 523.25;
const E5: f32 = 659.25;
const G5: f32 = 783.99;
const C6: f32 = 1046.50;
const A4: f32 = 440.00;
const A5: f32 = 880.00;

const fn sine(freq_hz: f32, duration_ms: u32) -> ToneSegment {
    ToneSegment {
        freq_hz,
        duration_ms,
        waveform: Waveform::Sine,
    }
}

const fn square(freq_hz: f32, duration_ms: u32) -> ToneSegment {
    ToneSegment {
        freq_hz,
        duration_ms,
        waveform: Waveform::Square,
    }
}

/// Work complete: ascending arpeggio fanfare.
pub const WORK_SPEC: CueSpec = CueSpec {
    segments: &[sine(C5, 120), sine(E5, 120), sine(G5, 120), sine(C6, 180)],
    vibration_ms: &[80, 40, 80],
};

/// Rest complete: descending chime.
pub const REST_SPEC: CueSpec = CueSpec {
    segments: &[sine(G5, 180), sine(E5, 180), sine(C5, 220)],
    vibration_ms: &[60],
};

/// Countdown tick: short click, no vibration.
pub const TICK_SPEC: CueSpec = CueSpec {
    segments: &[square(1000.0, 30)],
    vibration_ms: &[],
};

/// Work begins: rising square-wave blip.
pub const GO_SPEC: CueSpec = CueSpec {
    segments: &[square(A4, 90), square(A5, 140)],
    vibration_ms: &[120],
};

/// Render a cue to mono f32 PCM at [`SAMPLE_RATE`]. `volume` is clamped to
/// `0.0..=1.0`.
pub fn render(spec: &CueSpec, volume: f32) -> Vec<f32> {
    let gain = volume.clamp(0.0, 1.0);
    let total: usize = spec
        .segments
        .iter()
        .map(|s| samples_for_ms(s.duration_ms))
        .sum();
    let mut pcm = Vec::with_capacity(total);

    for segment in spec.segments {
        let n = samples_for_ms(segment.duration_ms);
        let ramp = samples_for_ms(RAMP_MS).min(n / 2).max(1);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let raw = sample_at(segment.waveform, segment.freq_hz, t);
            pcm.push(raw * envelope(i, n, ramp) * gain);
        }
    }
    pcm
}

fn samples_for_ms(ms: u32) -> usize {
    (SAMPLE_RATE as u64 * u64::from(ms) / 1000) as usize
}

fn sample_at(waveform: Waveform, freq_hz: f32, t: f32) -> f32 {
    let phase = (t * freq_hz).fract();
    match waveform {
        Waveform::Sine => (std::f32::consts::TAU * phase).sin(),
        // Square and triangle carry more harmonic energy; scale them down
        // so all cues sit at a comparable perceived loudness.
        Waveform::Square => {
            if phase < 0.5 {
                0.5
            } else {
                -0.5
            }
        }
        Waveform::Triangle => (1.0 - 4.0 * (phase - 0.5).abs()) * 0.8,
    }
}

/// Linear attack/release ramp over the first and last `ramp` samples.
fn envelope(i: usize, n: usize, ramp: usize) -> f32 {
    if i < ramp {
        i as f32 / ramp as f32
    } else if i >= n - ramp {
        (n - i - 1) as f32 / ramp as f32
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_length_matches_spec() {
        let pcm = render(&TICK_SPEC, 1.0);
        assert_eq!(pcm.len(), SAMPLE_RATE as usize * 30 / 1000);

        let pcm = render(&WORK_SPEC, 1.0);
        let expected_ms = WORK_SPEC.total_duration_ms() as usize;
        assert_eq!(pcm.len(), SAMPLE_RATE as usize * expected_ms / 1000);
    }

    #[test]
    fn envelope_silences_segment_edges() {
        let pcm = render(&REST_SPEC, 1.0);
        assert_eq!(pcm[0], 0.0);
        assert_eq!(*pcm.last().unwrap(), 0.0);
        // Mid-segment has actual signal.
        assert!(pcm.iter().any(|s| s.abs() > 0.3));
    }

    #[test]
    fn volume_scales_amplitude() {
        let loud = render(&GO_SPEC, 1.0);
        let quiet = render(&GO_SPEC, 0.25);
        let peak = |pcm: &[f32]| pcm.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let (loud_peak, quiet_peak) = (peak(&loud), peak(&quiet));
        assert!(loud_peak > quiet_peak);
        assert!((quiet_peak - loud_peak * 0.25).abs() < 0.01);
    }

    #[test]
    fn volume_out_of_range_clamps() {
        let pcm = render(&TICK_SPEC, 7.5);
        assert!(pcm.iter().all(|s| s.abs() <= 1.0));
        let silent = render(&TICK_SPEC, -1.0);
        assert!(silent.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn samples_stay_in_unit_range() {
        for spec in [&WORK_SPEC, &REST_SPEC, &TICK_SPEC, &GO_SPEC] {
            let pcm = render(spec, 1.0);
            assert!(pcm.iter().all(|s| s.abs() <= 1.0));
        }
    }

    #[test]
    fn cue_recipes_are_distinct() {
        // Each id must be recognizably different: compare segment shapes.
        assert_ne!(WORK_SPEC.segments, REST_SPEC.segments);
        assert_ne!(REST_SPEC.segments, GO_SPEC.segments);
        assert_ne!(TICK_SPEC.segments, GO_SPEC.segments);
        // Work ascends, rest descends.
        assert!(WORK_SPEC.segments[0].freq_hz < WORK_SPEC.segments[3].freq_hz);
        assert!(REST_SPEC.segments[0].freq_hz > REST_SPEC.segments[2].freq_hz);
    }
}
