//! Feature vector schema
//!
//! The full key set is generated from one declarative table so that the
//! populated and the all-null code paths can never drift apart. Key order
//! is fixed: tempo first, then the aggregate groups, then the per-row
//! groups, each expanded with its statistic suffixes.

/// Key of the global tempo estimate
pub const TEMPO_KEY: &str = "tempo_calc";

/// How a feature group is summarized into keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    /// One set of statistics over the whole matrix
    Aggregate,
    /// One set of statistics per row; keys carry a 1-based row index
    PerRow(usize),
}

/// A named feature group and its summary shape
#[derive(Debug, Clone, Copy)]
pub struct FeatureGroup {
    pub name: &'static str,
    pub kind: SummaryKind,
}

/// All feature groups in output order
pub const GROUPS: &[FeatureGroup] = &[
    FeatureGroup { name: "energy", kind: SummaryKind::Aggregate },
    FeatureGroup { name: "rms", kind: SummaryKind::Aggregate },
    FeatureGroup { name: "zcr", kind: SummaryKind::Aggregate },
    FeatureGroup { name: "spec_flat", kind: SummaryKind::Aggregate },
    FeatureGroup { name: "spec_cent", kind: SummaryKind::Aggregate },
    FeatureGroup { name: "spec_band", kind: SummaryKind::Aggregate },
    FeatureGroup { name: "mfcc", kind: SummaryKind::PerRow(20) },
    FeatureGroup { name: "spec_cont", kind: SummaryKind::PerRow(7) },
    FeatureGroup { name: "chroma", kind: SummaryKind::PerRow(12) },
    FeatureGroup { name: "tonnetz", kind: SummaryKind::PerRow(6) },
];

/// Statistic suffixes for aggregate groups, in key order
pub const AGGREGATE_STATS: [&str; 8] =
    ["mean", "var", "std", "min", "max", "median", "kurt", "skew"];

/// Statistic suffixes for per-row groups, in key order. Note the
/// abbreviated `med` and the different position of the median relative
/// to the aggregate suffixes; both are part of the stable schema.
pub const ROW_STATS: [&str; 8] = ["mean", "var", "std", "med", "min", "max", "kurt", "skew"];

/// Total number of feature keys: 1 tempo + 6 aggregate groups x 8 stats
/// + (20 + 7 + 12 + 6) rows x 8 stats.
pub const FEATURE_COUNT: usize = 409;

/// Generate the full ordered key list.
pub fn feature_keys() -> Vec<String> {
    let mut keys = Vec::with_capacity(FEATURE_COUNT);
    keys.push(TEMPO_KEY.to_string());
    for group in GROUPS {
        match group.kind {
            SummaryKind::Aggregate => {
                for stat in AGGREGATE_STATS {
                    keys.push(format!("{}_{}", group.name, stat));
                }
            }
            SummaryKind::PerRow(rows) => {
                for row in 1..=rows {
                    for stat in ROW_STATS {
                        keys.push(format!("{}{}_{}", group.name, row, stat));
                    }
                }
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_feature_count() {
        let keys = feature_keys();
        assert_eq!(keys.len(), FEATURE_COUNT);
        assert_eq!(keys.len(), 1 + 6 * 8 + (20 + 7 + 12 + 6) * 8);
    }

    #[test]
    fn test_keys_are_unique() {
        let keys = feature_keys();
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_key_order_starts_with_tempo() {
        let keys = feature_keys();
        assert_eq!(keys[0], "tempo_calc");
        assert_eq!(keys[1], "energy_mean");
        assert_eq!(keys[8], "energy_skew");
        assert_eq!(keys[9], "rms_mean");
    }

    #[test]
    fn test_row_indices_are_one_based() {
        let keys = feature_keys();
        assert!(keys.contains(&"mfcc1_mean".to_string()));
        assert!(keys.contains(&"mfcc20_skew".to_string()));
        assert!(!keys.contains(&"mfcc0_mean".to_string()));
        assert!(!keys.contains(&"mfcc21_mean".to_string()));
        assert!(keys.contains(&"chroma12_med".to_string()));
        assert!(keys.contains(&"tonnetz6_kurt".to_string()));
        assert!(keys.contains(&"spec_cont7_max".to_string()));
    }

    #[test]
    fn test_suffix_conventions_differ_by_kind() {
        let keys = feature_keys();
        // Aggregate groups spell out `median`; per-row groups use `med`
        assert!(keys.contains(&"zcr_median".to_string()));
        assert!(!keys.contains(&"zcr_med".to_string()));
        assert!(keys.contains(&"mfcc3_med".to_string()));
        assert!(!keys.contains(&"mfcc3_median".to_string()));
    }
}
