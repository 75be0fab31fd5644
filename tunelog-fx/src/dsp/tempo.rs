//! Global tempo estimation
//!
//! Spectral-flux onset envelope over the percussive component, scored by
//! autocorrelation across the 30-300 BPM lag range with a log-normal
//! prior centered on 120 BPM. Always returns a finite BPM; signals with
//! no rhythmic evidence fall back to the prior center.

use super::stft::{Stft, HOP_LENGTH};

/// Prior center in BPM; also the fallback for arrhythmic input
const PRIOR_BPM: f64 = 120.0;

/// Prior spread in octaves
const PRIOR_SIGMA: f64 = 1.0;

const BPM_MIN: f64 = 30.0;
const BPM_MAX: f64 = 300.0;

/// Estimate the tempo of a (percussive) signal in BPM.
pub fn estimate_tempo(stft: &Stft, percussive: &[f32], sample_rate: u32) -> f64 {
    let onset = onset_envelope(stft, percussive);
    let fps = sample_rate as f64 / HOP_LENGTH as f64;

    let lag_min = ((60.0 * fps / BPM_MAX).round() as usize).max(1);
    let lag_max = ((60.0 * fps / BPM_MIN).round() as usize).min(onset.len().saturating_sub(1));
    if lag_max < lag_min {
        return PRIOR_BPM;
    }

    // Mean-centered autocorrelation over candidate lags
    let mean = onset.iter().sum::<f64>() / onset.len() as f64;
    let centered: Vec<f64> = onset.iter().map(|&v| v - mean).collect();

    let mut best_lag = ((60.0 * fps / PRIOR_BPM).round() as usize).clamp(lag_min, lag_max);
    let mut best_score = f64::MIN;
    for lag in lag_min..=lag_max {
        let ac: f64 = (lag..centered.len())
            .map(|t| centered[t] * centered[t - lag])
            .sum();
        let bpm = 60.0 * fps / lag as f64;
        let octaves = (bpm / PRIOR_BPM).log2();
        let prior = (-0.5 * (octaves / PRIOR_SIGMA).powi(2)).exp();
        let score = ac.max(0.0) * prior;
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    // No positive autocorrelation anywhere means no periodicity to trust
    if best_score <= 0.0 {
        return PRIOR_BPM;
    }
    60.0 * fps / best_lag as f64
}

/// Half-wave rectified spectral flux on the log-compressed magnitude
/// spectrogram, one value per frame.
fn onset_envelope(stft: &Stft, signal: &[f32]) -> Vec<f64> {
    let mag = stft.transform(signal).magnitude();
    let mut envelope = Vec::with_capacity(mag.len());
    envelope.push(0.0);

    for t in 1..mag.len() {
        let mut flux = 0.0f64;
        for b in 0..mag[t].len() {
            let cur = (1.0 + mag[t][b] as f64).ln();
            let prev = (1.0 + mag[t - 1][b] as f64).ln();
            flux += (cur - prev).max(0.0);
        }
        envelope.push(flux / mag[t].len() as f64);
    }
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Click track: short bursts of noise-free impulses at the given BPM
    fn click_track(bpm: f64, sample_rate: u32, seconds: f64) -> Vec<f32> {
        let len = (sample_rate as f64 * seconds) as usize;
        let period = (60.0 / bpm * sample_rate as f64) as usize;
        let mut signal = vec![0.0f32; len];
        let mut pos = 0;
        while pos < len {
            for i in pos..(pos + 256).min(len) {
                signal[i] = if i % 2 == 0 { 0.9 } else { -0.9 };
            }
            pos += period;
        }
        signal
    }

    #[test]
    fn test_click_track_tempo() {
        let stft = Stft::new();
        let signal = click_track(120.0, 22050, 8.0);
        let bpm = estimate_tempo(&stft, &signal, 22050);
        assert!(
            (bpm - 120.0).abs() < 6.0,
            "expected ~120 BPM, got {}",
            bpm
        );
    }

    #[test]
    fn test_steady_tone_falls_back_to_prior() {
        let stft = Stft::new();
        let signal: Vec<f32> = (0..22050 * 2)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 22050.0).sin())
            .collect();
        let bpm = estimate_tempo(&stft, &signal, 22050);
        assert!(bpm.is_finite());
        assert!((BPM_MIN..=BPM_MAX).contains(&bpm));
    }

    #[test]
    fn test_very_short_signal_is_finite() {
        let stft = Stft::new();
        let bpm = estimate_tempo(&stft, &[0.1, -0.1, 0.2], 22050);
        assert_eq!(bpm, PRIOR_BPM);
    }
}
