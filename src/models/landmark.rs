// Data models for hand landmarks as produced by an external hand tracker

use serde::{Deserialize, Serialize};
use std::ops::{Div, Sub};

/// Number of landmarks in one hand skeleton
pub const HAND_LANDMARK_COUNT: usize = 21;

// ==============================================================================
// Landmark (single 3D point)
// ==============================================================================

/// A 3D hand landmark.
///
/// `x`/`y` are image-normalized (nominally `[0, 1]`), `z` is depth relative to
/// the wrist. Deserializes from either an `{x, y, z}` object or an
/// `[x, y, z, ...]` array; extra array entries (visibility, presence) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawLandmark")]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean length of the point treated as a vector
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance_to(&self, other: &Landmark) -> f64 {
        (*self - *other).magnitude()
    }
}

impl Sub for Landmark {
    type Output = Landmark;

    fn sub(self, rhs: Landmark) -> Landmark {
        Landmark::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Div<f64> for Landmark {
    type Output = Landmark;

    fn div(self, rhs: f64) -> Landmark {
        Landmark::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Wire shapes a landmark may arrive in
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLandmark {
    Object { x: f64, y: f64, z: f64 },
    Array(Vec<f64>),
}

impl TryFrom<RawLandmark> for Landmark {
    type Error = LandmarkError;

    fn try_from(raw: RawLandmark) -> LandmarkResult<Self> {
        let landmark = match raw {
            RawLandmark::Object { x, y, z } => Landmark::new(x, y, z),
            RawLandmark::Array(values) => {
                if values.len() < 3 {
                    return Err(LandmarkError::IncompleteArray(values.len()));
                }
                Landmark::new(values[0], values[1], values[2])
            }
        };

        if !landmark.is_finite() {
            return Err(LandmarkError::NonFinite);
        }

        Ok(landmark)
    }
}

// ==============================================================================
// Landmark Set (21 ordered points)
// ==============================================================================

/// The ordered 21-point skeleton of one hand.
///
/// Order follows [`HandLandmark`] and is never rearranged. Construction rejects
/// payloads with fewer than 21 points; longer payloads keep the first 21.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkSet(Vec<Landmark>);

impl LandmarkSet {
    pub fn points(&self) -> &[Landmark] {
        &self.0
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(mut points: Vec<Landmark>) -> LandmarkResult<Self> {
        if points.len() < HAND_LANDMARK_COUNT {
            return Err(LandmarkError::TooFewPoints {
                expected: HAND_LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        points.truncate(HAND_LANDMARK_COUNT);
        Ok(Self(points))
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(set: LandmarkSet) -> Self {
        set.0
    }
}

/// MediaPipe Hand Landmark indices (21 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    pub const fn index(self) -> usize {
        self as usize
    }
}

// ==============================================================================
// Observations
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    #[serde(alias = "Left", alias = "LEFT")]
    Left,
    #[serde(alias = "Right", alias = "RIGHT")]
    Right,
}

/// Number of hands in an observation or required by a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HandCount {
    One = 1,
    Two = 2,
}

impl TryFrom<u8> for HandCount {
    type Error = LandmarkError;

    fn try_from(value: u8) -> LandmarkResult<Self> {
        match value {
            1 => Ok(HandCount::One),
            2 => Ok(HandCount::Two),
            other => Err(LandmarkError::InvalidHandCount(other as i64)),
        }
    }
}

impl TryFrom<i64> for HandCount {
    type Error = LandmarkError;

    fn try_from(value: i64) -> LandmarkResult<Self> {
        u8::try_from(value)
            .map_err(|_| LandmarkError::InvalidHandCount(value))
            .and_then(HandCount::try_from)
    }
}

impl From<HandCount> for u8 {
    fn from(count: HandCount) -> Self {
        count as u8
    }
}

/// One tracked hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: LandmarkSet,
    pub handedness: Option<Handedness>,
    /// Tracker detection confidence in `[0, 1]`
    pub confidence: f64,
}

/// A query to be matched: one hand, or a left/right pair
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Single(HandObservation),
    Dual {
        left: HandObservation,
        right: HandObservation,
    },
}

impl Observation {
    pub fn hand_count(&self) -> HandCount {
        match self {
            Observation::Single(_) => HandCount::One,
            Observation::Dual { .. } => HandCount::Two,
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LandmarkError {
    #[error("Expected {expected} landmarks, got {actual}")]
    TooFewPoints { expected: usize, actual: usize },

    #[error("Landmark array needs x, y and z, got {0} values")]
    IncompleteArray(usize),

    #[error("Landmark coordinates must be finite numbers")]
    NonFinite,

    #[error("Hand count must be 1 or 2, got {0}")]
    InvalidHandCount(i64),
}

pub type LandmarkResult<T> = Result<T, LandmarkError>;
