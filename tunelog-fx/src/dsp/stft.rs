//! Short-time Fourier transform
//!
//! Shared framing convention for every frequency-domain transform in the
//! bank: 2048-point FFT, 512-sample hop, periodic Hann window, centered
//! frames over a reflect-padded signal. A signal of `L` samples always
//! produces `1 + L / 512` frames, so every frame-wise feature series lines
//! up column for column.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT window size for all spectral transforms
pub const N_FFT: usize = 2048;

/// Hop size between analysis frames
pub const HOP_LENGTH: usize = 512;

/// Number of non-negative frequency bins
pub const N_BINS: usize = N_FFT / 2 + 1;

/// Complex spectrogram, frame-major (`frames[t][bin]`)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<Vec<Complex<f32>>>,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Magnitude spectrogram, frame-major
    pub fn magnitude(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }
}

/// STFT engine with precomputed window and FFT plans
pub struct Stft {
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(N_FFT);
        let inverse = planner.plan_fft_inverse(N_FFT);

        // Periodic Hann window (period N_FFT), required for clean
        // overlap-add reconstruction at hop = N_FFT / 4.
        let window = (0..N_FFT)
            .map(|i| {
                0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / N_FFT as f32).cos())
            })
            .collect();

        Self {
            window,
            forward,
            inverse,
        }
    }

    /// Compute the centered STFT of a signal.
    pub fn transform(&self, signal: &[f32]) -> Spectrogram {
        let padded = reflect_pad(signal, N_FFT / 2);
        let num_frames = 1 + (padded.len() - N_FFT) / HOP_LENGTH;

        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0f32); N_FFT];

        for t in 0..num_frames {
            let start = t * HOP_LENGTH;
            for i in 0..N_FFT {
                buffer[i] = Complex::new(padded[start + i] * self.window[i], 0.0);
            }
            self.forward.process(&mut buffer);
            frames.push(buffer[..N_BINS].to_vec());
        }

        Spectrogram { frames }
    }

    /// Reconstruct a time-domain signal of `length` samples from a
    /// (possibly modified) spectrogram produced by [`Stft::transform`].
    ///
    /// Windowed overlap-add with window-sum-square normalization; the
    /// center padding added by the forward transform is stripped.
    pub fn inverse(&self, spec: &Spectrogram, length: usize) -> Vec<f32> {
        let num_frames = spec.num_frames();
        if num_frames == 0 || length == 0 {
            return vec![0.0; length];
        }

        let padded_len = (num_frames - 1) * HOP_LENGTH + N_FFT;
        let mut output = vec![0.0f32; padded_len];
        let mut window_sum = vec![0.0f32; padded_len];

        let mut buffer = vec![Complex::new(0.0f32, 0.0f32); N_FFT];
        for (t, frame) in spec.frames.iter().enumerate() {
            // Rebuild the full spectrum from the non-negative bins
            // (real signal, conjugate symmetry).
            for (k, &c) in frame.iter().enumerate() {
                buffer[k] = c;
            }
            for k in 1..N_FFT / 2 {
                buffer[N_FFT - k] = frame[k].conj();
            }
            self.inverse.process(&mut buffer);

            let start = t * HOP_LENGTH;
            for i in 0..N_FFT {
                // rustfft's inverse is unnormalized
                let sample = buffer[i].re / N_FFT as f32;
                output[start + i] += sample * self.window[i];
                window_sum[start + i] += self.window[i] * self.window[i];
            }
        }

        let pad = N_FFT / 2;
        let mut result = vec![0.0f32; length];
        for i in 0..length {
            let j = i + pad;
            if j < padded_len && window_sum[j] > 1e-8 {
                result[i] = output[j] / window_sum[j];
            }
        }
        result
    }
}

impl Default for Stft {
    fn default() -> Self {
        Self::new()
    }
}

/// Reflect-pad a signal by `pad` samples on each side (edge sample not
/// repeated). Signals shorter than the pad reflect off both ends as far
/// as they can and clamp beyond that.
pub fn reflect_pad(signal: &[f32], pad: usize) -> Vec<f32> {
    let len = signal.len();
    let mut out = Vec::with_capacity(len + 2 * pad);

    for i in (1..=pad).rev() {
        out.push(signal[i.min(len - 1)]);
    }
    out.extend_from_slice(signal);
    for i in 0..pad {
        let idx = len.saturating_sub(2 + i).min(len - 1);
        out.push(signal[idx]);
    }
    out
}

/// Pad a signal by repeating the edge samples (`edge` mode).
pub fn edge_pad(signal: &[f32], pad: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(signal.len() + 2 * pad);
    out.extend(std::iter::repeat(signal[0]).take(pad));
    out.extend_from_slice(signal);
    out.extend(std::iter::repeat(signal[signal.len() - 1]).take(pad));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_frame_count() {
        let signal = vec![0.1f32; 22050];
        let spec = Stft::new().transform(&signal);
        assert_eq!(spec.num_frames(), 1 + 22050 / HOP_LENGTH);
    }

    #[test]
    fn test_reflect_pad() {
        let padded = reflect_pad(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(padded, vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_edge_pad() {
        let padded = edge_pad(&[1.0, 2.0, 3.0], 2);
        assert_eq!(padded, vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_sine_peak_bin() {
        let sr = 22050;
        let signal = sine(440.0, sr, sr as usize);
        let spec = Stft::new().transform(&signal);
        let mag = spec.magnitude();

        // Peak bin of a middle frame should sit at ~440 Hz
        let frame = &mag[mag.len() / 2];
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let peak_hz = peak_bin as f32 * sr as f32 / N_FFT as f32;
        assert!(
            (peak_hz - 440.0).abs() < 30.0,
            "expected peak near 440 Hz, got {} Hz",
            peak_hz
        );
    }

    #[test]
    fn test_roundtrip_reconstruction() {
        let sr = 22050;
        let signal = sine(440.0, sr, 8192);
        let stft = Stft::new();
        let spec = stft.transform(&signal);
        let restored = stft.inverse(&spec, signal.len());

        assert_eq!(restored.len(), signal.len());
        // Interior samples should match closely; edges are lossier.
        for i in N_FFT..signal.len() - N_FFT {
            assert!(
                (restored[i] - signal[i]).abs() < 1e-3,
                "sample {} diverged: {} vs {}",
                i,
                restored[i],
                signal[i]
            );
        }
    }
}
