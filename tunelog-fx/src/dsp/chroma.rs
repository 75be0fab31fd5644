//! Chroma and tonal centroid (tonnetz) features
//!
//! Chroma maps spectral energy onto the 12 pitch classes through a
//! triangular semitone filterbank spanning 7 octaves from C1, then
//! normalizes each frame by its maximum. The tonnetz projects
//! L1-normalized chroma onto the 6-dimensional circle-of-fifths /
//! minor-third / major-third coordinate system.

use super::stft::N_FFT;
use super::FeatureMatrix;

/// Number of pitch classes
pub const N_CHROMA: usize = 12;

/// Tonnetz dimensionality
pub const N_TONNETZ: usize = 6;

/// C1, the lowest pitch covered by the chroma filterbank
const FMIN_HZ: f64 = 32.703_195_662_574_82;

const SEMITONE_BINS: usize = 84; // 7 octaves x 12

const TINY: f64 = 1e-10;

/// Build the pitch-class filterbank (`N_CHROMA` x spectrum bins).
///
/// One triangular filter per semitone, centered on the equal-tempered
/// pitch and reaching to its neighbors, folded onto pitch classes and
/// L1-normalized per class.
pub fn chroma_filterbank(sample_rate: u32, num_bins: usize) -> Vec<Vec<f64>> {
    let nyquist = sample_rate as f64 / 2.0;
    let semitone_ratio = 2.0f64.powf(1.0 / 12.0);

    let mut filters = vec![vec![0.0f64; num_bins]; N_CHROMA];
    for s in 0..SEMITONE_BINS {
        let center = FMIN_HZ * 2.0f64.powf(s as f64 / 12.0);
        if center > nyquist {
            break;
        }
        let half_width = center * (semitone_ratio - 1.0);
        let class = s % N_CHROMA;

        for k in 0..num_bins {
            let f = k as f64 * sample_rate as f64 / N_FFT as f64;
            let d = (f - center).abs();
            if d < half_width {
                filters[class][k] += 1.0 - d / half_width;
            }
        }
    }

    for row in filters.iter_mut() {
        let sum: f64 = row.iter().sum();
        if sum > TINY {
            for w in row.iter_mut() {
                *w /= sum;
            }
        }
    }
    filters
}

/// Chroma energy per frame (`N_CHROMA` rows), max-normalized per frame.
pub fn chroma(power_frames: &[Vec<f32>], sample_rate: u32) -> FeatureMatrix {
    let num_bins = power_frames.first().map_or(0, |f| f.len());
    let filterbank = chroma_filterbank(sample_rate, num_bins);
    let num_frames = power_frames.len();

    let mut rows = vec![vec![0.0f64; num_frames]; N_CHROMA];
    for (t, frame) in power_frames.iter().enumerate() {
        for (pc, filter) in filterbank.iter().enumerate() {
            rows[pc][t] = filter
                .iter()
                .zip(frame.iter())
                .map(|(&w, &p)| w * p as f64)
                .sum();
        }

        // Per-frame max normalization
        let max = (0..N_CHROMA).fold(0.0f64, |acc, pc| acc.max(rows[pc][t]));
        if max > TINY {
            for pc in 0..N_CHROMA {
                rows[pc][t] /= max;
            }
        }
    }

    FeatureMatrix::from_rows(rows)
}

/// Project chroma frames onto tonal centroid coordinates (`N_TONNETZ`
/// rows). Each chroma frame is L1-normalized before projection.
pub fn tonnetz(chroma: &FeatureMatrix) -> FeatureMatrix {
    // Interval circles: fifths, minor thirds, major thirds, with the
    // major-third circle at half radius.
    let basis: Vec<[f64; 2]> = vec![
        [7.0 * std::f64::consts::PI / 6.0, 1.0],
        [3.0 * std::f64::consts::PI / 2.0, 1.0],
        [2.0 * std::f64::consts::PI / 3.0, 0.5],
    ];

    let num_frames = chroma.num_cols();
    let mut rows = vec![vec![0.0f64; num_frames]; N_TONNETZ];

    for t in 0..num_frames {
        let l1: f64 = (0..N_CHROMA).map(|pc| chroma.row(pc)[t].abs()).sum();
        for (b, &[angle, radius]) in basis.iter().enumerate() {
            let mut sin_acc = 0.0f64;
            let mut cos_acc = 0.0f64;
            for pc in 0..N_CHROMA {
                let c = if l1 > TINY {
                    chroma.row(pc)[t] / l1
                } else {
                    0.0
                };
                let phi = angle * pc as f64;
                sin_acc += radius * phi.sin() * c;
                cos_acc += radius * phi.cos() * c;
            }
            rows[2 * b][t] = sin_acc;
            rows[2 * b + 1][t] = cos_acc;
        }
    }

    FeatureMatrix::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::stft::{Stft, N_BINS};

    fn sine_power_frames(freq: f32, sr: u32) -> Vec<Vec<f32>> {
        let signal: Vec<f32> = (0..sr as usize)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        Stft::new()
            .transform(&signal)
            .magnitude()
            .iter()
            .map(|f| f.iter().map(|&m| m * m).collect())
            .collect()
    }

    #[test]
    fn test_filterbank_shape() {
        let fb = chroma_filterbank(22050, N_BINS);
        assert_eq!(fb.len(), N_CHROMA);
        assert_eq!(fb[0].len(), N_BINS);
    }

    #[test]
    fn test_a440_maps_to_pitch_class_a() {
        // C1 is semitone 0, so A is pitch class 9
        let frames = sine_power_frames(440.0, 22050);
        let c = chroma(&frames, 22050);
        assert_eq!(c.num_rows(), N_CHROMA);

        let t = c.num_cols() / 2;
        let strongest = (0..N_CHROMA)
            .max_by(|&a, &b| c.row(a)[t].partial_cmp(&c.row(b)[t]).unwrap())
            .unwrap();
        assert_eq!(strongest, 9, "440 Hz should land on pitch class A");
        assert!((c.row(9)[t] - 1.0).abs() < 1e-9, "max-normalized frame");
    }

    #[test]
    fn test_tonnetz_shape_and_range() {
        let frames = sine_power_frames(261.63, 22050); // C4
        let c = chroma(&frames, 22050);
        let tc = tonnetz(&c);
        assert_eq!(tc.num_rows(), N_TONNETZ);
        assert_eq!(tc.num_cols(), c.num_cols());
        for row in tc.rows() {
            for &v in row {
                // L1-normalized chroma keeps coordinates within circle radii
                assert!(v.abs() <= 1.0 + 1e-9);
                assert!(v.is_finite());
            }
        }
    }

    #[test]
    fn test_tonnetz_silence_is_zero() {
        let c = FeatureMatrix::from_rows(vec![vec![0.0; 4]; N_CHROMA]);
        let tc = tonnetz(&c);
        for row in tc.rows() {
            assert!(row.iter().all(|&v| v == 0.0));
        }
    }
}
