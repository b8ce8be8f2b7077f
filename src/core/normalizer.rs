// Landmark normalization: wrist-relative, scale-invariant canonical form

use crate::models::gesture::SampleLandmarks;
use crate::models::landmark::{HandLandmark, Landmark, HAND_LANDMARK_COUNT};
use serde::{Deserialize, Serialize};

/// Scales below this are treated as a degenerate hand and replaced by 1.0
pub const MIN_SCALE: f64 = 0.001;

/// How the scale factor of a landmark set is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Distance from the wrist to the middle fingertip (live detection, stored caches)
    #[default]
    WristToMiddleTip,
    /// Largest x/y/z extent of the raw set (sample comparison tooling)
    BoundingBox,
}

/// Normalize with the wrist-to-middle-fingertip scale.
///
/// Returns an empty vector when the input has fewer than 21 points or a
/// non-finite coordinate.
pub fn normalize(points: &[Landmark]) -> Vec<Landmark> {
    normalize_with(points, NormalizationMethod::WristToMiddleTip)
}

/// Normalize with the bounding-box scale
pub fn normalize_bounding_box(points: &[Landmark]) -> Vec<Landmark> {
    normalize_with(points, NormalizationMethod::BoundingBox)
}

pub fn normalize_with(points: &[Landmark], method: NormalizationMethod) -> Vec<Landmark> {
    if points.len() < HAND_LANDMARK_COUNT {
        return Vec::new();
    }
    let points = &points[..HAND_LANDMARK_COUNT];
    if points.iter().any(|p| !p.is_finite()) {
        return Vec::new();
    }

    let origin = points[HandLandmark::Wrist.index()];
    let translated: Vec<Landmark> = points.iter().map(|&p| p - origin).collect();

    let scale = match method {
        NormalizationMethod::WristToMiddleTip => {
            translated[HandLandmark::MiddleFingerTip.index()].magnitude()
        }
        NormalizationMethod::BoundingBox => bounding_box_extent(points),
    };
    let scale = if scale < MIN_SCALE { 1.0 } else { scale };

    translated.into_iter().map(|p| p / scale).collect()
}

fn bounding_box_extent(points: &[Landmark]) -> f64 {
    let range = |axis: fn(&Landmark) -> f64| {
        let (min, max) = points
            .iter()
            .map(axis)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        max - min
    };

    range(|p| p.x).max(range(|p| p.y)).max(range(|p| p.z))
}

/// Normalize every hand of a stored sample payload
pub fn normalize_sample(landmarks: &SampleLandmarks, method: NormalizationMethod) -> SampleLandmarks {
    match landmarks {
        SampleLandmarks::Single(points) => SampleLandmarks::Single(normalize_with(points, method)),
        SampleLandmarks::Dual { left, right } => SampleLandmarks::Dual {
            left: normalize_with(left, method),
            right: normalize_with(right, method),
        },
    }
}
