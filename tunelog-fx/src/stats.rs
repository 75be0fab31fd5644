//! Descriptive statistics over feature series
//!
//! Population moments (no Bessel correction), Fisher excess kurtosis, and
//! the midpoint-averaging median. Zero-variance series report kurtosis
//! and skewness as 0.0 so that every summary stays finite.

use crate::dsp::FeatureMatrix;

const TINY: f64 = 1e-12;

/// The eight summary statistics computed for every feature series
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStats {
    pub mean: f64,
    pub var: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub kurt: f64,
    pub skew: f64,
}

/// Summarize a series. An empty series yields all zeros.
pub fn summarize(values: &[f64]) -> SummaryStats {
    if values.is_empty() {
        return SummaryStats::default();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
        min = min.min(v);
        max = max.max(v);
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    let (kurt, skew) = if m2 > TINY {
        (m4 / (m2 * m2) - 3.0, m3 / m2.powf(1.5))
    } else {
        (0.0, 0.0)
    };

    SummaryStats {
        mean,
        var: m2,
        std: m2.sqrt(),
        min,
        max,
        median: median(values),
        kurt,
        skew,
    }
}

/// Summarize an aggregate feature group.
///
/// The first six statistics are computed over every value in the matrix;
/// kurtosis and skewness are computed over the first row only. For the
/// single-row matrices produced by the frame-wise transforms the two
/// views coincide.
pub fn summarize_aggregate(matrix: &FeatureMatrix) -> SummaryStats {
    let flat: Vec<f64> = matrix.flatten().collect();
    let mut stats = summarize(&flat);
    if matrix.num_rows() > 0 {
        let first_row = summarize(matrix.row(0));
        stats.kurt = first_row.kurt;
        stats.skew = first_row.skew;
    }
    stats
}

/// Summarize each row of a matrix independently.
pub fn summarize_rows(matrix: &FeatureMatrix) -> Vec<SummaryStats> {
    matrix.rows().iter().map(|row| summarize(row)).collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_known_moments() {
        let stats = summarize(&[1.0, 2.0, 3.0, 4.0]);
        assert!((stats.mean - 2.5).abs() < EPS);
        // Population variance, not sample variance
        assert!((stats.var - 1.25).abs() < EPS);
        assert!((stats.std - 1.25f64.sqrt()).abs() < EPS);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert!((stats.median - 2.5).abs() < EPS);
        // Symmetric series
        assert!(stats.skew.abs() < EPS);
        // Uniform {1,2,3,4}: m4 = 2.5625, m2^2 = 1.5625
        assert!((stats.kurt - (2.5625 / 1.5625 - 3.0)).abs() < EPS);
    }

    #[test]
    fn test_median_odd_length() {
        let stats = summarize(&[5.0, 1.0, 3.0]);
        assert_eq!(stats.median, 3.0);
    }

    #[test]
    fn test_constant_series_has_zero_higher_moments() {
        let stats = summarize(&[2.0; 10]);
        assert_eq!(stats.var, 0.0);
        assert_eq!(stats.kurt, 0.0);
        assert_eq!(stats.skew, 0.0);
        assert!(stats.mean.is_finite());
    }

    #[test]
    fn test_empty_series_is_all_zeros() {
        assert_eq!(summarize(&[]), SummaryStats::default());
    }

    #[test]
    fn test_skew_sign() {
        // Long right tail
        let stats = summarize(&[1.0, 1.0, 1.0, 10.0]);
        assert!(stats.skew > 0.0);
    }

    #[test]
    fn test_aggregate_higher_moments_use_first_row() {
        // Two rows with very different shapes: the flat view and the
        // first-row view disagree on kurtosis/skewness.
        let matrix = FeatureMatrix::from_rows(vec![
            vec![1.0, 1.0, 1.0, 10.0],
            vec![1.0, 2.0, 3.0, 4.0],
        ]);
        let stats = summarize_aggregate(&matrix);
        let first_row = summarize(&[1.0, 1.0, 1.0, 10.0]);
        let flat = summarize(&[1.0, 1.0, 1.0, 10.0, 1.0, 2.0, 3.0, 4.0]);

        assert_eq!(stats.kurt, first_row.kurt);
        assert_eq!(stats.skew, first_row.skew);
        assert_eq!(stats.mean, flat.mean);
        assert_eq!(stats.min, flat.min);
        assert_eq!(stats.max, flat.max);
    }

    #[test]
    fn test_summarize_rows_independent() {
        let matrix =
            FeatureMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]);
        let stats = summarize_rows(&matrix);
        assert_eq!(stats.len(), 2);
        assert!((stats[0].mean - 2.0).abs() < EPS);
        assert!((stats[1].mean - 20.0).abs() < EPS);
    }
}
