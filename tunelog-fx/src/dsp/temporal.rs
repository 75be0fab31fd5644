//! Time-domain features: peak normalization, zero-crossing rate, RMS and
//! short-time energy.

use super::stft::{edge_pad, HOP_LENGTH, N_FFT};
use super::FeatureMatrix;

/// Scale a signal so its peak absolute amplitude is 1.0.
///
/// An all-zero signal is returned unchanged.
pub fn peak_normalize(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    if peak > 0.0 {
        samples.iter().map(|&s| s / peak).collect()
    } else {
        samples.to_vec()
    }
}

/// Zero-crossing rate per frame (edge-padded, centered frames).
///
/// One row, `1 + len / 512` columns; each value is the fraction of
/// consecutive sample pairs in the frame whose signs differ.
pub fn zero_crossing_rate(signal: &[f32]) -> FeatureMatrix {
    let padded = edge_pad(signal, N_FFT / 2);
    let num_frames = 1 + (padded.len() - N_FFT) / HOP_LENGTH;

    let mut rates = Vec::with_capacity(num_frames);
    for t in 0..num_frames {
        let frame = &padded[t * HOP_LENGTH..t * HOP_LENGTH + N_FFT];
        let mut crossings = 0usize;
        for pair in frame.windows(2) {
            if (pair[0] >= 0.0) != (pair[1] >= 0.0) {
                crossings += 1;
            }
        }
        rates.push(crossings as f64 / N_FFT as f64);
    }
    FeatureMatrix::single_row(rates)
}

/// Root-mean-square amplitude per frame (zero-padded, centered frames).
pub fn rms(signal: &[f32]) -> FeatureMatrix {
    let pad = N_FFT / 2;
    let mut padded = vec![0.0f32; signal.len() + 2 * pad];
    padded[pad..pad + signal.len()].copy_from_slice(signal);

    let num_frames = 1 + (padded.len() - N_FFT) / HOP_LENGTH;
    let mut values = Vec::with_capacity(num_frames);
    for t in 0..num_frames {
        let frame = &padded[t * HOP_LENGTH..t * HOP_LENGTH + N_FFT];
        let mean_sq: f64 =
            frame.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / N_FFT as f64;
        values.push(mean_sq.sqrt());
    }
    FeatureMatrix::single_row(values)
}

/// Short-time energy: sum of squared samples over a 2048-sample window
/// hopped by 512, without padding. Trailing partial windows are included,
/// so a signal of `L` samples yields `ceil(L / 512)` values.
pub fn short_time_energy(signal: &[f32]) -> FeatureMatrix {
    let mut values = Vec::new();
    let len = signal.len();
    let mut start = 0usize;
    while start < len {
        let end = (start + N_FFT).min(len);
        let sum: f64 = signal[start..end]
            .iter()
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        values.push(sum);
        start += HOP_LENGTH;
    }
    FeatureMatrix::single_row(values)
}
