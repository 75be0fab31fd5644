//! Frame-wise spectral shape features: flatness, centroid, bandwidth and
//! octave-band spectral contrast.

use super::stft::N_FFT;
use super::FeatureMatrix;

const AMIN: f64 = 1e-10;

/// Number of spectral contrast bands
pub const N_CONTRAST_BANDS: usize = 7;

/// Fraction of band bins averaged to form the peak and valley estimates
const CONTRAST_QUANTILE: f64 = 0.02;

fn bin_frequency(bin: usize, sample_rate: u32) -> f64 {
    bin as f64 * sample_rate as f64 / N_FFT as f64
}

/// Spectral flatness per frame: geometric mean over arithmetic mean of the
/// power spectrum. 1.0 for white noise, near 0 for pure tones.
pub fn spectral_flatness(power_frames: &[Vec<f32>]) -> FeatureMatrix {
    let values = power_frames
        .iter()
        .map(|frame| {
            let n = frame.len() as f64;
            let log_sum: f64 = frame.iter().map(|&p| (p as f64).max(AMIN).ln()).sum();
            let mean: f64 = frame.iter().map(|&p| (p as f64).max(AMIN)).sum::<f64>() / n;
            (log_sum / n).exp() / mean
        })
        .collect();
    FeatureMatrix::single_row(values)
}

/// Magnitude-weighted mean frequency per frame, in Hz.
pub fn spectral_centroid(mag_frames: &[Vec<f32>], sample_rate: u32) -> FeatureMatrix {
    let values = mag_frames
        .iter()
        .map(|frame| centroid_of(frame, sample_rate))
        .collect();
    FeatureMatrix::single_row(values)
}

fn centroid_of(frame: &[f32], sample_rate: u32) -> f64 {
    let total: f64 = frame.iter().map(|&m| m as f64).sum();
    if total <= AMIN {
        return 0.0;
    }
    let weighted: f64 = frame
        .iter()
        .enumerate()
        .map(|(k, &m)| bin_frequency(k, sample_rate) * m as f64)
        .sum();
    weighted / total
}

/// Magnitude-weighted standard deviation around the centroid, in Hz.
pub fn spectral_bandwidth(mag_frames: &[Vec<f32>], sample_rate: u32) -> FeatureMatrix {
    let values = mag_frames
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().map(|&m| m as f64).sum();
            if total <= AMIN {
                return 0.0;
            }
            let centroid = centroid_of(frame, sample_rate);
            let spread: f64 = frame
                .iter()
                .enumerate()
                .map(|(k, &m)| {
                    let d = bin_frequency(k, sample_rate) - centroid;
                    (m as f64 / total) * d * d
                })
                .sum();
            spread.sqrt()
        })
        .collect();
    FeatureMatrix::single_row(values)
}

/// Spectral contrast: per-band difference between peak and valley energy
/// in decibels, over octave bands starting at 200 Hz.
///
/// Returns `N_CONTRAST_BANDS` rows, one column per frame.
pub fn spectral_contrast(power_frames: &[Vec<f32>], sample_rate: u32) -> FeatureMatrix {
    let nyquist = sample_rate as f64 / 2.0;
    // Octave band edges; the last band extends to Nyquist.
    let mut edges = vec![0.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0, nyquist];
    for e in edges.iter_mut() {
        if *e > nyquist {
            *e = nyquist;
        }
    }

    // Bin ranges per band; each band keeps at least one bin.
    let hz_per_bin = sample_rate as f64 / N_FFT as f64;
    let bands: Vec<(usize, usize)> = (0..N_CONTRAST_BANDS)
        .map(|b| {
            let lo = (edges[b] / hz_per_bin).round() as usize;
            let hi = ((edges[b + 1] / hz_per_bin).round() as usize).max(lo + 1);
            let max_bin = power_frames.first().map_or(1, |f| f.len());
            (lo.min(max_bin - 1), hi.min(max_bin))
        })
        .collect();

    let mut rows = vec![Vec::with_capacity(power_frames.len()); N_CONTRAST_BANDS];
    let mut band_power: Vec<f64> = Vec::new();

    for frame in power_frames {
        for (b, &(lo, hi)) in bands.iter().enumerate() {
            band_power.clear();
            band_power.extend(frame[lo..hi].iter().map(|&p| p as f64));
            band_power.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let q = ((band_power.len() as f64 * CONTRAST_QUANTILE).round() as usize).max(1);
            let valley: f64 = band_power[..q].iter().sum::<f64>() / q as f64;
            let peak: f64 =
                band_power[band_power.len() - q..].iter().sum::<f64>() / q as f64;

            rows[b].push(10.0 * (peak.max(AMIN)).log10() - 10.0 * (valley.max(AMIN)).log10());
        }
    }

    FeatureMatrix::from_rows(rows)
}
