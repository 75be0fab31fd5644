//! Feature vector assembly
//!
//! Turns raw analysis matrices into the ordered, fixed-schema feature
//! vector, and provides the tolerant collection entry point that maps
//! every acquisition or analysis failure onto the all-null vector.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, warn};

use crate::acquire::{AcquireError, PreviewFetcher};
use crate::dsp::{DspError, FeatureMatrix, RawFeatures, TransformBank};
use crate::schema::{feature_keys, SummaryKind, AGGREGATE_STATS, GROUPS, ROW_STATS, TEMPO_KEY};
use crate::stats::{summarize_aggregate, summarize_rows, SummaryStats};

/// Feature extraction errors
#[derive(Debug, thiserror::Error)]
pub enum FxError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Dsp(#[from] DspError),
}

/// An ordered feature vector with the fixed key schema.
///
/// Every vector carries exactly the same keys in the same order; values
/// are `None` when the source audio was unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, Option<f64>)>,
}

impl FeatureVector {
    /// The all-null vector emitted when no audio could be analyzed
    pub fn null() -> Self {
        Self {
            entries: feature_keys().into_iter().map(|k| (k, None)).collect(),
        }
    }

    fn from_raw(raw: &RawFeatures) -> Self {
        let mut entries = Vec::with_capacity(crate::schema::FEATURE_COUNT);
        entries.push((TEMPO_KEY.to_string(), Some(raw.tempo_bpm)));

        for group in GROUPS {
            let matrix = group_matrix(raw, group.name);
            match group.kind {
                SummaryKind::Aggregate => {
                    let stats = summarize_aggregate(matrix);
                    for stat in AGGREGATE_STATS {
                        entries.push((
                            format!("{}_{}", group.name, stat),
                            Some(stat_value(&stats, stat)),
                        ));
                    }
                }
                SummaryKind::PerRow(rows) => {
                    debug_assert_eq!(matrix.num_rows(), rows);
                    for (i, stats) in summarize_rows(matrix).iter().enumerate() {
                        for stat in ROW_STATS {
                            entries.push((
                                format!("{}{}_{}", group.name, i + 1, stat),
                                Some(stat_value(stats, stat)),
                            ));
                        }
                    }
                }
            }
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every value is `None`
    pub fn is_null(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_none())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<Option<f64>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn group_matrix<'a>(raw: &'a RawFeatures, name: &str) -> &'a FeatureMatrix {
    match name {
        "energy" => &raw.energy,
        "rms" => &raw.rms,
        "zcr" => &raw.zcr,
        "spec_flat" => &raw.spec_flat,
        "spec_cent" => &raw.spec_cent,
        "spec_band" => &raw.spec_band,
        "mfcc" => &raw.mfcc,
        "spec_cont" => &raw.spec_cont,
        "chroma" => &raw.chroma,
        "tonnetz" => &raw.tonnetz,
        other => unreachable!("feature group {} has no matrix", other),
    }
}

fn stat_value(stats: &SummaryStats, suffix: &str) -> f64 {
    match suffix {
        "mean" => stats.mean,
        "var" => stats.var,
        "std" => stats.std,
        "min" => stats.min,
        "max" => stats.max,
        "median" | "med" => stats.median,
        "kurt" => stats.kurt,
        "skew" => stats.skew,
        other => unreachable!("unknown statistic suffix {}", other),
    }
}

/// Analyze a decoded mono buffer into a populated feature vector.
pub fn extract_feature_vector(
    samples: &[f32],
    sample_rate: u32,
) -> Result<FeatureVector, FxError> {
    let bank = TransformBank::new(sample_rate)?;
    let raw = bank.analyze(samples)?;
    Ok(FeatureVector::from_raw(&raw))
}

/// Fetch a preview clip and extract its feature vector.
///
/// This is the tolerant entry point used during enrichment: a missing
/// URL, a failed download or an undecodable clip all produce the
/// all-null vector instead of an error, so one bad track never aborts a
/// batch. Each failure mode is logged distinctly before being conflated.
pub async fn collect_rich_features(
    fetcher: &PreviewFetcher,
    preview_url: Option<&str>,
) -> FeatureVector {
    let url = match preview_url {
        Some(url) => url,
        None => {
            debug!("no preview URL available, emitting null features");
            return FeatureVector::null();
        }
    };

    let audio = match fetcher.fetch(url).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(url = %url, error = %e, "preview acquisition failed, emitting null features");
            return FeatureVector::null();
        }
    };

    match extract_feature_vector(&audio.samples, audio.sample_rate) {
        Ok(vector) => vector,
        Err(e) => {
            warn!(url = %url, error = %e, "analysis failed, emitting null features");
            FeatureVector::null()
        }
    }
}
