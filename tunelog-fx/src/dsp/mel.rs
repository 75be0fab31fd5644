//! Mel filterbank and MFCC extraction
//!
//! 128 triangular HTK-scale mel filters over the power spectrogram,
//! log-compressed to decibels, then an orthonormal DCT-II keeps the first
//! 20 cepstral coefficients.

use super::stft::{N_BINS, N_FFT};
use super::FeatureMatrix;

/// Number of mel bands in the filterbank
pub const N_MELS: usize = 128;

/// Number of cepstral coefficients retained
pub const N_MFCC: usize = 20;

const AMIN: f64 = 1e-10;

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0f64.powf(mel / 2595.0) - 1.0)
}

/// Build the triangular mel filterbank (`N_MELS` x `N_BINS`).
///
/// Each filter is area-normalized (Slaney style) so that filter response
/// does not grow with bandwidth.
pub fn mel_filterbank(sample_rate: u32) -> Vec<Vec<f64>> {
    let nyquist = sample_rate as f64 / 2.0;
    let mel_max = hz_to_mel(nyquist);

    // n_mels + 2 equally spaced mel points; consecutive triples define
    // each triangle's (left, center, right) corner frequencies.
    let corners: Vec<f64> = (0..N_MELS + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (N_MELS + 1) as f64))
        .collect();

    let bin_hz: Vec<f64> = (0..N_BINS)
        .map(|k| k as f64 * sample_rate as f64 / N_FFT as f64)
        .collect();

    let mut filters = vec![vec![0.0f64; N_BINS]; N_MELS];
    for m in 0..N_MELS {
        let (left, center, right) = (corners[m], corners[m + 1], corners[m + 2]);
        let norm = 2.0 / (right - left);
        for (k, &f) in bin_hz.iter().enumerate() {
            let weight = if f <= left || f >= right {
                0.0
            } else if f <= center {
                (f - left) / (center - left)
            } else {
                (right - f) / (right - center)
            };
            filters[m][k] = weight * norm;
        }
    }
    filters
}

/// Compute MFCCs (`N_MFCC` rows, one column per frame) from a frame-major
/// power spectrogram.
pub fn mfcc(power_frames: &[Vec<f32>], sample_rate: u32) -> FeatureMatrix {
    let filterbank = mel_filterbank(sample_rate);
    let num_frames = power_frames.len();

    // DCT-II basis with orthonormal scaling
    let scale0 = (1.0 / N_MELS as f64).sqrt();
    let scale = (2.0 / N_MELS as f64).sqrt();

    let mut rows = vec![Vec::with_capacity(num_frames); N_MFCC];
    let mut log_mel = vec![0.0f64; N_MELS];

    for frame in power_frames {
        for (m, filter) in filterbank.iter().enumerate() {
            let energy: f64 = filter
                .iter()
                .zip(frame.iter())
                .map(|(&w, &p)| w * p as f64)
                .sum();
            log_mel[m] = 10.0 * energy.max(AMIN).log10();
        }

        for (k, row) in rows.iter_mut().enumerate() {
            let mut acc = 0.0f64;
            for (m, &v) in log_mel.iter().enumerate() {
                acc += v
                    * (std::f64::consts::PI * k as f64 * (m as f64 + 0.5) / N_MELS as f64).cos();
            }
            row.push(acc * if k == 0 { scale0 } else { scale });
        }
    }

    FeatureMatrix::from_rows(rows)
}
