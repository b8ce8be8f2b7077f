// Similarity scoring between normalized landmark sets

use crate::core::normalizer::{normalize_sample, NormalizationMethod};
use crate::models::gesture::{SampleLandmarks, TrainingSample};
use crate::models::landmark::Landmark;
use serde::{Deserialize, Serialize};

/// Decay rate of the exponential similarity transform
pub const EXPONENTIAL_DECAY_RATE: f64 = 10.0;

/// Maps a mean per-point distance onto a `[0, 1]` similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityTransform {
    /// `max(0, 1 - d)`
    LinearClamp,
    /// `exp(-10 d)`, the stricter form used by live detection
    #[default]
    ExponentialDecay,
}

impl SimilarityTransform {
    pub fn apply(self, average_distance: f64) -> f64 {
        let similarity = match self {
            SimilarityTransform::LinearClamp => 1.0 - average_distance,
            SimilarityTransform::ExponentialDecay => (-EXPONENTIAL_DECAY_RATE * average_distance).exp(),
        };
        if similarity.is_nan() {
            return 0.0;
        }
        similarity.clamp(0.0, 1.0)
    }
}

/// Mean Euclidean distance between corresponding points.
///
/// `None` when either set is empty or the lengths differ.
pub fn average_distance(a: &[Landmark], b: &[Landmark]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let total: f64 = a.iter().zip(b).map(|(p, q)| p.distance_to(q)).sum();
    Some(total / a.len() as f64)
}

/// Similarity of two normalized sets, 0 when they are not comparable
pub fn similarity(a: &[Landmark], b: &[Landmark], transform: SimilarityTransform) -> f64 {
    average_distance(a, b).map_or(0.0, |d| transform.apply(d))
}

/// Per-hand similarity averaged over left and right
pub fn dual_similarity(
    query: (&[Landmark], &[Landmark]),
    reference: (&[Landmark], &[Landmark]),
    transform: SimilarityTransform,
) -> f64 {
    let left = similarity(query.0, reference.0, transform);
    let right = similarity(query.1, reference.1, transform);
    (left + right) / 2.0
}

/// Compare two normalized sample payloads; mismatched hand counts score 0
pub fn sample_similarity(query: &SampleLandmarks, reference: &SampleLandmarks, transform: SimilarityTransform) -> f64 {
    match (query, reference) {
        (SampleLandmarks::Single(a), SampleLandmarks::Single(b)) => similarity(a, b, transform),
        (
            SampleLandmarks::Dual { left: ql, right: qr },
            SampleLandmarks::Dual { left: rl, right: rr },
        ) => dual_similarity((ql.as_slice(), qr.as_slice()), (rl.as_slice(), rr.as_slice()), transform),
        _ => 0.0,
    }
}

// ==============================================================================
// Sample Comparison (administrative tooling)
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleComparison {
    pub sample_a: String,
    pub sample_b: String,
    pub similarity: f64,
    /// Mean per-point distance, averaged over hands for dual samples
    pub average_distance: Option<f64>,
    pub normalization: NormalizationMethod,
    pub transform: SimilarityTransform,
}

/// Compare two stored samples from their raw landmarks using the
/// bounding-box scale and linear similarity.
pub fn compare_samples(a: &TrainingSample, b: &TrainingSample) -> SampleComparison {
    let normalization = NormalizationMethod::BoundingBox;
    let transform = SimilarityTransform::LinearClamp;
    let left = normalize_sample(&a.landmarks, normalization);
    let right = normalize_sample(&b.landmarks, normalization);

    let average_distance = match (&left, &right) {
        (SampleLandmarks::Single(p), SampleLandmarks::Single(q)) => average_distance(p, q),
        (
            SampleLandmarks::Dual { left: pl, right: pr },
            SampleLandmarks::Dual { left: ql, right: qr },
        ) => match (average_distance(pl, ql), average_distance(pr, qr)) {
            (Some(l), Some(r)) => Some((l + r) / 2.0),
            _ => None,
        },
        _ => None,
    };

    SampleComparison {
        sample_a: a.id.clone(),
        sample_b: b.id.clone(),
        similarity: sample_similarity(&left, &right, transform),
        average_distance,
        normalization,
        transform,
    }
}
