// Shared hand poses and builders for unit tests

use crate::models::gesture::{Gesture, GestureCandidate, SampleLandmarks, TrainingSample};
use crate::models::landmark::{HandCount, HandObservation, Handedness, Landmark, LandmarkSet, Observation};

const OPEN_HAND: [(f64, f64, f64); 21] = [
    (0.5, 0.8, 0.0),
    (0.42, 0.75, -0.01),
    (0.36, 0.70, -0.02),
    (0.31, 0.65, -0.03),
    (0.27, 0.60, -0.04),
    (0.45, 0.58, 0.0),
    (0.44, 0.48, -0.01),
    (0.435, 0.42, -0.015),
    (0.43, 0.37, -0.02),
    (0.5, 0.57, 0.0),
    (0.5, 0.46, -0.01),
    (0.5, 0.39, -0.015),
    (0.5, 0.33, -0.02),
    (0.55, 0.58, 0.0),
    (0.56, 0.48, -0.01),
    (0.565, 0.42, -0.015),
    (0.57, 0.37, -0.02),
    (0.6, 0.61, 0.0),
    (0.615, 0.54, -0.01),
    (0.625, 0.49, -0.015),
    (0.63, 0.45, -0.02),
];

const FIST: [(f64, f64, f64); 21] = [
    (0.5, 0.8, 0.0),
    (0.44, 0.74, -0.01),
    (0.41, 0.69, -0.02),
    (0.42, 0.65, -0.03),
    (0.45, 0.63, -0.04),
    (0.45, 0.6, 0.0),
    (0.45, 0.55, -0.03),
    (0.46, 0.6, -0.04),
    (0.46, 0.64, -0.03),
    (0.5, 0.59, 0.0),
    (0.5, 0.54, -0.03),
    (0.5, 0.6, -0.04),
    (0.5, 0.64, -0.03),
    (0.55, 0.6, 0.0),
    (0.55, 0.55, -0.03),
    (0.54, 0.6, -0.04),
    (0.54, 0.64, -0.03),
    (0.59, 0.62, 0.0),
    (0.59, 0.58, -0.03),
    (0.58, 0.62, -0.04),
    (0.58, 0.65, -0.03),
];

fn to_points(raw: &[(f64, f64, f64)]) -> Vec<Landmark> {
    raw.iter().map(|&(x, y, z)| Landmark::new(x, y, z)).collect()
}

/// Flat open palm, fingers spread upwards
pub fn open_hand() -> Vec<Landmark> {
    to_points(&OPEN_HAND)
}

/// Closed fist seen from the front
pub fn fist() -> Vec<Landmark> {
    to_points(&FIST)
}

/// Every landmark except the wrist shifted along x
pub fn distorted_open_hand(dx: f64) -> Vec<Landmark> {
    open_hand()
        .into_iter()
        .enumerate()
        .map(|(i, p)| if i == 0 { p } else { Landmark::new(p.x + dx, p.y, p.z) })
        .collect()
}

pub fn single_observation(points: Vec<Landmark>) -> Observation {
    Observation::Single(HandObservation {
        landmarks: LandmarkSet::try_from(points).expect("21 points"),
        handedness: Some(Handedness::Right),
        confidence: 0.95,
    })
}

pub fn dual_observation(left: Vec<Landmark>, right: Vec<Landmark>) -> Observation {
    Observation::Dual {
        left: HandObservation {
            landmarks: LandmarkSet::try_from(left).expect("21 points"),
            handedness: Some(Handedness::Left),
            confidence: 0.9,
        },
        right: HandObservation {
            landmarks: LandmarkSet::try_from(right).expect("21 points"),
            handedness: Some(Handedness::Right),
            confidence: 0.9,
        },
    }
}

pub fn gesture(id: &str, label: &str, dual: bool) -> Gesture {
    Gesture {
        id: id.to_string(),
        name: label.to_lowercase().replace(' ', "-"),
        label: label.to_string(),
        description: None,
        is_active: true,
        supports_dual_hand: dual,
        metadata: serde_json::Value::Null,
        created_at: 0,
        updated_at: 0,
    }
}

/// Validated sample without a cached normalized form
pub fn sample(id: &str, gesture_id: &str, landmarks: SampleLandmarks) -> TrainingSample {
    let hand_count: HandCount = landmarks.hand_count();
    TrainingSample {
        id: id.to_string(),
        gesture_id: gesture_id.to_string(),
        landmarks,
        normalized: None,
        hand_count,
        confidence_score: 0.9,
        is_validated: true,
        notes: None,
        metadata: serde_json::Value::Null,
        created_at: 0,
        updated_at: 0,
    }
}

pub fn candidate(gesture: Gesture, samples: Vec<TrainingSample>) -> GestureCandidate {
    GestureCandidate { gesture, samples }
}
