//! Synthetic ECG telemetry for demos and tests.
//!
//! Produces the same wire format as the wearable: a short calibration
//! preamble, then one sample line per tick with the device heart rate and
//! irregularity appended on beat samples.

use crate::transport::ScriptedChunk;
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::time::Duration;

/// Parameters for a synthetic recording.
#[derive(Debug, Clone)]
pub struct SyntheticEcg {
    pub heart_rate: u32,
    /// Irregularity reported by the device and applied as interval jitter
    pub irregularity: f64,
    pub duration: Duration,
    pub sample_rate_hz: u32,
    /// Samples per transport chunk
    pub samples_per_chunk: usize,
}

impl Default for SyntheticEcg {
    fn default() -> Self {
        Self {
            heart_rate: 72,
            irregularity: 0.05,
            duration: Duration::from_secs(10),
            sample_rate_hz: 125,
            samples_per_chunk: 10,
        }
    }
}

/// Render a synthetic recording as paced transport chunks.
pub fn synthetic_ecg(params: &SyntheticEcg) -> Vec<ScriptedChunk> {
    let rate = params.sample_rate_hz.max(1) as f64;
    let total_samples = (params.duration.as_secs_f64() * rate).round() as usize;
    let base_interval = 60.0 / params.heart_rate.max(1) as f64;
    let irregularity = params.irregularity.clamp(0.0, 1.0);
    let per_chunk = params.samples_per_chunk.max(1);
    let chunk_delay = Duration::from_secs_f64(per_chunk as f64 / rate);

    let mut chunks = vec![
        ScriptedChunk::now("Calibration Starting\n"),
        ScriptedChunk::now("Baseline 0.000,0.000\n"),
    ];

    let mut beat_index = 0u32;
    let mut last_beat = 0.0;
    let mut interval = jittered_interval(base_interval, irregularity, beat_index);
    let mut next_beat = interval;
    let mut text = String::new();

    for i in 0..total_samples {
        let t = i as f64 / rate;
        let lead_ii = pqrst(t - last_beat, base_interval);
        let lead_i = lead_ii * 0.6;
        let _ = write!(text, "{lead_i:.4},{lead_ii:.4}");

        if t >= next_beat {
            let bpm = (60.0 / interval).round() as u32;
            let _ = write!(text, ",{bpm},{irregularity:.3}");
            beat_index += 1;
            last_beat = next_beat;
            interval = jittered_interval(base_interval, irregularity, beat_index);
            next_beat += interval;
        }
        text.push('\n');

        if (i + 1) % per_chunk == 0 {
            chunks.push(ScriptedChunk::new(chunk_delay, std::mem::take(&mut text)));
        }
    }
    if !text.is_empty() {
        chunks.push(ScriptedChunk::new(chunk_delay, text));
    }

    chunks
}

/// Deterministic beat-to-beat variation scaled by irregularity.
fn jittered_interval(base: f64, irregularity: f64, beat_index: u32) -> f64 {
    let wobble = (beat_index as f64 * 2.39).sin();
    (base * (1.0 + 0.3 * irregularity * wobble)).max(0.25)
}

/// Rough PQRST complex in millivolts at `dt` seconds after a beat.
fn pqrst(dt: f64, beat_interval: f64) -> f64 {
    let dt = dt.rem_euclid(beat_interval.max(0.25));
    let wave = |center: f64, width: f64, height: f64| {
        height * (-((dt - center) / width).powi(2) * 0.5).exp()
    };
    wave(-0.16 + beat_interval, 0.025, 0.15) // P wave of the next beat
        + wave(-0.03, 0.010, -0.10)
        + wave(0.0, 0.012, 1.20)
        + wave(0.03, 0.010, -0.25)
        + wave(0.25, 0.040, 0.30)
        + 0.02 * (2.0 * PI * 0.25 * dt).sin()
}
