//! Harmonic / percussive source separation
//!
//! Median filtering on the magnitude spectrogram: smoothing across time
//! enhances harmonic (horizontal) structure, smoothing across frequency
//! enhances percussive (vertical) structure. Soft Wiener-style masks with
//! power 2 split the complex STFT, and both components are resynthesized
//! by inverse STFT.

use super::stft::{Spectrogram, Stft};

/// Median filter kernel length (odd), applied along time or frequency
const KERNEL: usize = 31;

const EPS: f32 = 1e-10;

/// Split a signal into its harmonic and percussive components.
///
/// `spec` must be the STFT of the signal and `length` its sample count;
/// both returned components have exactly `length` samples.
pub fn hpss(stft: &Stft, spec: &Spectrogram, length: usize) -> (Vec<f32>, Vec<f32>) {
    let mag = spec.magnitude();
    let num_frames = mag.len();
    if num_frames == 0 {
        return (vec![0.0; length], vec![0.0; length]);
    }
    let num_bins = mag[0].len();

    let half = KERNEL / 2;
    let mut scratch: Vec<f32> = Vec::with_capacity(KERNEL);

    // Harmonic enhancement: median across frames at each bin
    let mut harm = vec![vec![0.0f32; num_bins]; num_frames];
    for b in 0..num_bins {
        for t in 0..num_frames {
            scratch.clear();
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(num_frames);
            for tt in lo..hi {
                scratch.push(mag[tt][b]);
            }
            harm[t][b] = median(&mut scratch);
        }
    }

    // Percussive enhancement: median across bins within each frame
    let mut perc = vec![vec![0.0f32; num_bins]; num_frames];
    for t in 0..num_frames {
        for b in 0..num_bins {
            scratch.clear();
            let lo = b.saturating_sub(half);
            let hi = (b + half + 1).min(num_bins);
            scratch.extend_from_slice(&mag[t][lo..hi]);
            perc[t][b] = median(&mut scratch);
        }
    }

    // Soft masks, power 2
    let mut harm_frames = Vec::with_capacity(num_frames);
    let mut perc_frames = Vec::with_capacity(num_frames);
    for t in 0..num_frames {
        let mut hf = Vec::with_capacity(num_bins);
        let mut pf = Vec::with_capacity(num_bins);
        for b in 0..num_bins {
            let h2 = harm[t][b] * harm[t][b];
            let p2 = perc[t][b] * perc[t][b];
            let denom = h2 + p2;
            let (mask_h, mask_p) = if denom > EPS {
                (h2 / denom, p2 / denom)
            } else {
                (0.5, 0.5)
            };
            hf.push(spec.frames[t][b] * mask_h);
            pf.push(spec.frames[t][b] * mask_p);
        }
        harm_frames.push(hf);
        perc_frames.push(pf);
    }

    let harmonic = stft.inverse(&Spectrogram { frames: harm_frames }, length);
    let percussive = stft.inverse(&Spectrogram { frames: perc_frames }, length);
    (harmonic, percussive)
}

/// Median of a scratch buffer (sorts in place; even lengths average the
/// two middle values).
fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
