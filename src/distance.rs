//! Distance metrics between points
//!
//! Five closed-form metrics over equal-length `f64` vectors, plus an
//! all-pairs mode that builds a symmetric distance matrix for a batch of
//! points.
//!
//! | Metric    | Formula                                   |
//! |-----------|-------------------------------------------|
//! | euclidean | `sqrt(Σ (a_i - b_i)²)`                    |
//! | manhattan | `Σ |a_i - b_i|`                           |
//! | cosine    | `1 - a·b / (|a| |b|)`, 1.0 for zero norms |
//! | hamming   | `#{ i : a_i != b_i }`                     |
//! | jaccard   | `1 - Σ min / Σ max`, 0.0 for empty union  |

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::metadata::{new_id, timestamp_now};

/// Errors raised by the distance engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistanceError {
    #[error("Unsupported calculation type: {0}")]
    InvalidMetric(String),

    #[error("Points must have same dimensionality: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("At least 2 points required for batch calculation, got {0}")]
    InsufficientPoints(usize),
}

/// Supported distance metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// L2 norm of the difference
    #[default]
    Euclidean,
    /// L1 norm of the difference
    Manhattan,
    /// One minus cosine similarity (0.0 - 2.0)
    Cosine,
    /// Number of differing positions
    Hamming,
    /// Weighted Jaccard distance for non-negative vectors
    Jaccard,
}

impl Metric {
    /// All metrics, in the order they are advertised
    pub const ALL: [Metric; 5] = [
        Metric::Euclidean,
        Metric::Manhattan,
        Metric::Cosine,
        Metric::Hamming,
        Metric::Jaccard,
    ];

    /// Wire name of the metric
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Cosine => "cosine",
            Metric::Hamming => "hamming",
            Metric::Jaccard => "jaccard",
        }
    }

    /// Distance between two points, checking dimensionality first
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, DistanceError> {
        if a.len() != b.len() {
            return Err(DistanceError::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(self.evaluate(a, b))
    }

    /// Apply the formula. Callers guarantee equal lengths.
    fn evaluate(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Euclidean => euclidean(a, b),
            Metric::Manhattan => manhattan(a, b),
            Metric::Cosine => cosine(a, b),
            Metric::Hamming => hamming(a, b),
            Metric::Jaccard => jaccard(a, b),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| DistanceError::InvalidMetric(s.to_string()))
    }
}

/// Squares are taken relative to the largest difference so they cannot overflow
fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    let scale = a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (x - y) / scale;
            d * d
        })
        .sum();
    scale * sum.sqrt()
}

fn manhattan(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    // Rounding can push identical or opposite vectors just past the bounds
    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0)
}

fn hamming(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).filter(|(x, y)| x != y).count() as f64
}

fn jaccard(a: &[f64], b: &[f64]) -> f64 {
    let (intersection, union) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0), |(min_sum, max_sum), (x, y)| {
            (min_sum + x.min(*y), max_sum + x.max(*y))
        });

    if union == 0.0 {
        return 0.0;
    }

    1.0 - intersection / union
}

/// Metadata attached to a single-pair result
#[derive(Debug, Clone, Serialize)]
pub struct CalculationMetadata {
    pub timestamp: String,
    pub calculation_id: String,
}

/// Result of comparing two points
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseResult {
    pub distance: f64,
    pub calculation_type: Metric,
    pub point_a: Vec<f64>,
    pub point_b: Vec<f64>,
    pub dimensionality: usize,
    pub metadata: CalculationMetadata,
}

/// One deduplicated entry of a distance matrix (`i < j`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationPair {
    pub point_indices: [usize; 2],
    pub distance: f64,
}

/// Metadata attached to a batch result
#[derive(Debug, Clone, Serialize)]
pub struct BatchMetadata {
    pub timestamp: String,
    pub batch_id: String,
    pub point_count: usize,
}

/// Result of an all-pairs computation
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub distance_matrix: Vec<Vec<f64>>,
    pub calculation_type: Metric,
    pub points: Vec<Vec<f64>>,
    pub calculation_pairs: Vec<CalculationPair>,
    pub metadata: BatchMetadata,
}

/// Compute the distance between two points
pub fn calculate(
    point_a: Vec<f64>,
    point_b: Vec<f64>,
    metric: Metric,
) -> Result<PairwiseResult, DistanceError> {
    let distance = metric.distance(&point_a, &point_b)?;
    debug!(%metric, dimensionality = point_a.len(), distance, "calculated distance");

    Ok(PairwiseResult {
        distance,
        calculation_type: metric,
        dimensionality: point_a.len(),
        point_a,
        point_b,
        metadata: CalculationMetadata {
            timestamp: timestamp_now(),
            calculation_id: new_id(),
        },
    })
}

/// Compute the full distance matrix and pair list for a batch of points
pub fn batch_calculate(points: Vec<Vec<f64>>, metric: Metric) -> Result<BatchResult, DistanceError> {
    let distance_matrix = distance_matrix(&points, metric)?;
    let calculation_pairs = calculation_pairs(&distance_matrix);
    debug!(%metric, point_count = points.len(), "calculated distance matrix");

    Ok(BatchResult {
        distance_matrix,
        calculation_type: metric,
        metadata: BatchMetadata {
            timestamp: timestamp_now(),
            batch_id: new_id(),
            point_count: points.len(),
        },
        points,
        calculation_pairs,
    })
}

/// Build the symmetric `N×N` matrix with a zero diagonal
///
/// Every formula is symmetric in its arguments, so each unordered pair is
/// evaluated once and mirrored. Rows are computed on the rayon pool.
pub fn distance_matrix(points: &[Vec<f64>], metric: Metric) -> Result<Vec<Vec<f64>>, DistanceError> {
    if points.len() < 2 {
        return Err(DistanceError::InsufficientPoints(points.len()));
    }

    let dimensionality = points[0].len();
    if let Some(bad) = points.iter().find(|p| p.len() != dimensionality) {
        return Err(DistanceError::DimensionMismatch {
            expected: dimensionality,
            actual: bad.len(),
        });
    }

    let n = points.len();
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            points[i + 1..]
                .iter()
                .map(|other| metric.evaluate(&points[i], other))
                .collect()
        })
        .collect();

    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in upper.into_iter().enumerate() {
        for (offset, d) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }

    Ok(matrix)
}

/// Upper-triangle entries of a matrix in row-major order
pub fn calculation_pairs(matrix: &[Vec<f64>]) -> Vec<CalculationPair> {
    matrix
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .skip(i + 1)
                .map(move |(j, &distance)| CalculationPair {
                    point_indices: [i, j],
                    distance,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dist(metric: Metric, a: &[f64], b: &[f64]) -> f64 {
        metric.distance(a, b).unwrap()
    }

    #[test]
    fn test_euclidean_three_four_five() {
        let result = calculate(vec![0.0, 0.0], vec![3.0, 4.0], Metric::Euclidean).unwrap();
        assert_eq!(result.distance, 5.0);
        assert_eq!(result.dimensionality, 2);
        assert_eq!(result.calculation_type, Metric::Euclidean);
    }

    #[test]
    fn test_euclidean_large_coordinates_stay_finite() {
        assert_eq!(dist(Metric::Euclidean, &[1e200], &[-1e200]), 2e200);
        let big = 2f64.powi(700);
        assert_eq!(dist(Metric::Euclidean, &[0.0, 0.0], &[3.0 * big, 4.0 * big]), 5.0 * big);
        let tiny = 2f64.powi(-700);
        assert_eq!(dist(Metric::Euclidean, &[0.0, 0.0], &[3.0 * tiny, 4.0 * tiny]), 5.0 * tiny);
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(dist(Metric::Manhattan, &[1.0, 2.0, 3.0], &[4.0, 0.0, 3.0]), 5.0);
    }

    #[test]
    fn test_cosine_identical_is_exactly_zero() {
        let result = calculate(vec![1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0], Metric::Cosine).unwrap();
        assert_eq!(result.distance, 0.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(dist(Metric::Cosine, &[0.0, 0.0], &[1.0, 2.0]), 1.0);
        assert_eq!(dist(Metric::Cosine, &[3.0, 4.0], &[0.0, 0.0]), 1.0);
        assert_eq!(dist(Metric::Cosine, &[0.0], &[0.0]), 1.0);
    }

    #[test]
    fn test_cosine_opposite_and_orthogonal() {
        assert_eq!(dist(Metric::Cosine, &[1.0, 0.0], &[-1.0, 0.0]), 2.0);
        assert_eq!(dist(Metric::Cosine, &[1.0, 0.0], &[0.0, 1.0]), 1.0);
    }

    #[test]
    fn test_hamming_counts_differences() {
        assert_eq!(
            dist(Metric::Hamming, &[1.0, 0.0, 1.0, 1.0], &[1.0, 1.0, 1.0, 0.0]),
            2.0
        );
    }

    #[test]
    fn test_jaccard() {
        // min sum = 1 + 0 = 1, max sum = 2 + 1 = 3
        let d = dist(Metric::Jaccard, &[1.0, 1.0], &[2.0, 0.0]);
        assert!((d - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(dist(Metric::Jaccard, &[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = calculate(vec![1.0, 2.0], vec![1.0, 2.0, 3.0], Metric::Euclidean).unwrap_err();
        assert_eq!(
            err,
            DistanceError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("cosine".parse::<Metric>().unwrap(), Metric::Cosine);
        assert_eq!(
            "chebyshev".parse::<Metric>().unwrap_err(),
            DistanceError::InvalidMetric("chebyshev".to_string())
        );
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_metric_serializes_lowercase() {
        let json = serde_json::to_string(&Metric::Jaccard).unwrap();
        assert_eq!(json, "\"jaccard\"");
    }

    #[test]
    fn test_batch_requires_two_points() {
        assert_eq!(
            batch_calculate(vec![vec![1.0, 2.0]], Metric::Euclidean).unwrap_err(),
            DistanceError::InsufficientPoints(1)
        );
        assert_eq!(
            batch_calculate(Vec::new(), Metric::Euclidean).unwrap_err(),
            DistanceError::InsufficientPoints(0)
        );
    }

    #[test]
    fn test_batch_rejects_ragged_points() {
        let err = batch_calculate(
            vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![1.0]],
            Metric::Manhattan,
        )
        .unwrap_err();
        assert!(matches!(err, DistanceError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_batch_matrix_and_pairs() {
        let points = vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![6.0, 8.0]];
        let result = batch_calculate(points, Metric::Euclidean).unwrap();

        assert_eq!(
            result.distance_matrix,
            vec![
                vec![0.0, 5.0, 10.0],
                vec![5.0, 0.0, 5.0],
                vec![10.0, 5.0, 0.0],
            ]
        );
        assert_eq!(result.metadata.point_count, 3);

        let indices: Vec<[usize; 2]> = result.calculation_pairs.iter().map(|p| p.point_indices).collect();
        assert_eq!(indices, vec![[0, 1], [0, 2], [1, 2]]);
        assert_eq!(result.calculation_pairs[1].distance, 10.0);
    }

    #[test]
    fn test_batch_result_json_shape() {
        let result = batch_calculate(vec![vec![1.0], vec![2.0]], Metric::Hamming).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["calculation_type"], "hamming");
        assert_eq!(json["calculation_pairs"][0]["point_indices"], serde_json::json!([0, 1]));
        assert_eq!(json["metadata"]["point_count"], 2);
        assert!(json["metadata"]["batch_id"].is_string());
    }

    fn arb_pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        (1usize..16).prop_flat_map(|len| {
            (
                proptest::collection::vec(-100.0f64..100.0, len),
                proptest::collection::vec(-100.0f64..100.0, len),
            )
        })
    }

    fn arb_points() -> impl Strategy<Value = Vec<Vec<f64>>> {
        (2usize..8, 1usize..6).prop_flat_map(|(n, dim)| {
            proptest::collection::vec(proptest::collection::vec(-50.0f64..50.0, dim), n)
        })
    }

    proptest! {
        #[test]
        fn euclidean_is_symmetric_and_non_negative((a, b) in arb_pair()) {
            let ab = dist(Metric::Euclidean, &a, &b);
            let ba = dist(Metric::Euclidean, &b, &a);
            prop_assert_eq!(ab, ba);
            prop_assert!(ab >= 0.0);
            prop_assert_eq!(dist(Metric::Euclidean, &a, &a), 0.0);
        }

        #[test]
        fn cosine_stays_in_range((a, b) in arb_pair()) {
            let d = dist(Metric::Cosine, &a, &b);
            prop_assert!((0.0..=2.0).contains(&d), "cosine out of range: {}", d);
        }

        #[test]
        fn cosine_of_zero_vector_is_one((a, _b) in arb_pair()) {
            let zero = vec![0.0; a.len()];
            prop_assert_eq!(dist(Metric::Cosine, &zero, &a), 1.0);
        }

        #[test]
        fn jaccard_zero_union_is_zero(len in 1usize..10) {
            let a = vec![0.0; len];
            let b: Vec<f64> = (0..len).map(|i| -(i as f64)).collect();
            prop_assert_eq!(dist(Metric::Jaccard, &a, &b), 0.0);
        }

        #[test]
        fn hamming_counts_exactly((a, b) in arb_pair()) {
            let expected = a.iter().zip(&b).filter(|(x, y)| x != y).count() as f64;
            prop_assert_eq!(dist(Metric::Hamming, &a, &b), expected);
            prop_assert_eq!(dist(Metric::Hamming, &a, &a), 0.0);
        }

        #[test]
        fn batch_matrix_is_symmetric_with_zero_diagonal(points in arb_points()) {
            for metric in Metric::ALL {
                let matrix = distance_matrix(&points, metric).unwrap();
                prop_assert_eq!(matrix.len(), points.len());
                for i in 0..matrix.len() {
                    prop_assert_eq!(matrix[i][i], 0.0);
                    for j in 0..matrix.len() {
                        prop_assert_eq!(matrix[i][j], matrix[j][i]);
                    }
                }
            }
        }

        #[test]
        fn batch_entries_match_pairwise(points in arb_points()) {
            let matrix = distance_matrix(&points, Metric::Manhattan).unwrap();
            for i in 0..points.len() {
                for j in 0..points.len() {
                    if i != j {
                        prop_assert_eq!(matrix[i][j], dist(Metric::Manhattan, &points[i], &points[j]));
                    }
                }
            }
        }
    }
}
