//! Signal analysis transforms
//!
//! [`TransformBank::analyze`] runs every transform over a decoded,
//! mono, 22050 Hz buffer and returns the raw per-frame feature matrices.
//! All transforms share the framing convention defined in [`stft`].

pub mod chroma;
pub mod hpss;
pub mod mel;
pub mod spectral;
pub mod stft;
pub mod tempo;
pub mod temporal;

use thiserror::Error;
use tracing::debug;

use stft::Stft;

/// Analysis errors
#[derive(Debug, Error)]
pub enum DspError {
    #[error("empty audio buffer")]
    EmptyBuffer,

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// A real-valued feature matrix, row-major. Frame-wise features with one
/// value per frame are stored as a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].len() == w[1].len()));
        Self { rows }
    }

    pub fn single_row(values: Vec<f64>) -> Self {
        Self { rows: vec![values] }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// All values in row-major order
    pub fn flatten(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flatten().copied()
    }
}

/// Raw analysis output: global tempo plus per-frame feature matrices
#[derive(Debug, Clone)]
pub struct RawFeatures {
    pub tempo_bpm: f64,
    pub energy: FeatureMatrix,
    pub rms: FeatureMatrix,
    pub zcr: FeatureMatrix,
    pub spec_flat: FeatureMatrix,
    pub spec_cent: FeatureMatrix,
    pub spec_band: FeatureMatrix,
    pub mfcc: FeatureMatrix,
    pub spec_cont: FeatureMatrix,
    pub chroma: FeatureMatrix,
    pub tonnetz: FeatureMatrix,
}

/// Runs the full transform set over an audio buffer.
///
/// Construction precomputes the FFT plans; one bank can analyze any
/// number of buffers at the same sample rate.
pub struct TransformBank {
    sample_rate: u32,
    stft: Stft,
}

impl TransformBank {
    pub fn new(sample_rate: u32) -> Result<Self, DspError> {
        if sample_rate == 0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            sample_rate,
            stft: Stft::new(),
        })
    }

    /// Analyze a mono buffer and return all raw feature matrices.
    ///
    /// The buffer is peak-normalized before analysis, so results do not
    /// depend on the absolute level of the decoded audio.
    pub fn analyze(&self, samples: &[f32]) -> Result<RawFeatures, DspError> {
        if samples.is_empty() {
            return Err(DspError::EmptyBuffer);
        }

        let y = temporal::peak_normalize(samples);
        debug!(samples = y.len(), sample_rate = self.sample_rate, "analyzing buffer");

        let spec = self.stft.transform(&y);
        let mag = spec.magnitude();
        let power: Vec<Vec<f32>> = mag
            .iter()
            .map(|frame| frame.iter().map(|&m| m * m).collect())
            .collect();

        let (harmonic, percussive) = hpss::hpss(&self.stft, &spec, y.len());
        let tempo_bpm = tempo::estimate_tempo(&self.stft, &percussive, self.sample_rate);

        let harmonic_power: Vec<Vec<f32>> = self
            .stft
            .transform(&harmonic)
            .magnitude()
            .iter()
            .map(|frame| frame.iter().map(|&m| m * m).collect())
            .collect();

        let chroma = chroma::chroma(&harmonic_power, self.sample_rate);
        let full_chroma = chroma::chroma(&power, self.sample_rate);
        let tonnetz = chroma::tonnetz(&full_chroma);

        Ok(RawFeatures {
            tempo_bpm,
            energy: temporal::short_time_energy(&y),
            rms: temporal::rms(&y),
            zcr: temporal::zero_crossing_rate(&y),
            spec_flat: spectral::spectral_flatness(&power),
            spec_cent: spectral::spectral_centroid(&mag, self.sample_rate),
            spec_band: spectral::spectral_bandwidth(&mag, self.sample_rate),
            mfcc: mel::mfcc(&power, self.sample_rate),
            spec_cont: spectral::spectral_contrast(&power, self.sample_rate),
            chroma,
            tonnetz,
        })
    }
}
