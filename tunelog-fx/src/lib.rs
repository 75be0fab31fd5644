//! tunelog-fx: audio feature extraction
//!
//! Downloads short preview clips, decodes and resamples them, runs a
//! fixed bank of signal transforms, and condenses the results into an
//! ordered feature vector with a stable 409-key schema. Tracks whose
//! audio cannot be obtained receive the same vector with every value
//! null, so downstream datasets keep a uniform shape.

pub mod acquire;
pub mod dsp;
pub mod features;
pub mod schema;
pub mod stats;

pub use acquire::{AcquireError, AudioBuffer, PreviewFetcher, TARGET_SAMPLE_RATE};
pub use features::{collect_rich_features, extract_feature_vector, FeatureVector, FxError};
pub use schema::{feature_keys, FEATURE_COUNT};
