//! Preview audio acquisition
//!
//! Downloads a preview clip over HTTP, decodes it with Symphonia,
//! downmixes to mono and resamples to the fixed 22050 Hz analysis rate.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::io::Cursor;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

/// Sample rate every analysis buffer is resampled to
pub const TARGET_SAMPLE_RATE: u32 = 22_050;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors in fetching or preparing preview audio
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Preview download returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Decoded audio contains no samples")]
    EmptyAudio,
}

/// Decoded mono audio ready for analysis
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Fetches and decodes preview clips
pub struct PreviewFetcher {
    http: reqwest::Client,
}

impl PreviewFetcher {
    pub fn new() -> Result<Self, AcquireError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tunelog/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Download a preview clip and return it decoded, mono, at
    /// [`TARGET_SAMPLE_RATE`].
    pub async fn fetch(&self, url: &str) -> Result<AudioBuffer, AcquireError> {
        debug!(url = %url, "downloading preview clip");
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AcquireError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "preview downloaded");

        self.prepare(&bytes)
    }

    /// Decode raw container bytes and resample to the analysis rate.
    pub fn prepare(&self, bytes: &[u8]) -> Result<AudioBuffer, AcquireError> {
        let decoded = decode_bytes(bytes)?;
        resample_to_target(decoded)
    }
}

/// Decode an in-memory audio container to mono f32 at its native rate.
fn decode_bytes(bytes: &[u8]) -> Result<AudioBuffer, AcquireError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AcquireError::Decode(format!("unrecognized container: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AcquireError::Decode("no decodable audio track".to_string()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AcquireError::Decode("missing sample rate".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AcquireError::Decode(format!("unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AcquireError::Decode(format!("packet read: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                let mut buf =
                    SampleBuffer::<f32>::new(audio_buf.capacity() as u64, *audio_buf.spec());
                buf.copy_interleaved_ref(audio_buf);

                // Downmix interleaved channels by averaging
                for frame in buf.samples().chunks(channels) {
                    let sum: f32 = frame.iter().sum();
                    samples.push(sum / channels as f32);
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packets are skipped rather than failing the clip
                warn!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(AcquireError::Decode(format!("decode: {}", e))),
        }
    }

    if samples.is_empty() {
        return Err(AcquireError::EmptyAudio);
    }
    Ok(AudioBuffer {
        samples,
        sample_rate,
    })
}

/// Resample a mono buffer to [`TARGET_SAMPLE_RATE`] in a single pass.
fn resample_to_target(audio: AudioBuffer) -> Result<AudioBuffer, AcquireError> {
    if audio.sample_rate == TARGET_SAMPLE_RATE {
        return Ok(audio);
    }

    let ratio = TARGET_SAMPLE_RATE as f64 / audio.sample_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 2.0, params, audio.samples.len(), 1)
            .map_err(|e| AcquireError::Resample(e.to_string()))?;

    let mut output = resampler
        .process(&[audio.samples], None)
        .map_err(|e| AcquireError::Resample(e.to_string()))?;

    let samples = output
        .pop()
        .ok_or_else(|| AcquireError::Resample("resampler produced no channel".to_string()))?;
    if samples.is_empty() {
        return Err(AcquireError::EmptyAudio);
    }

    debug!(
        input_rate = audio.sample_rate,
        output_rate = TARGET_SAMPLE_RATE,
        output_samples = samples.len(),
        "resampled preview"
    );
    Ok(AudioBuffer {
        samples,
        sample_rate: TARGET_SAMPLE_RATE,
    })
}
