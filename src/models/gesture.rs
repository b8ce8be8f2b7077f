// Data models for gestures and their labeled training samples

use crate::models::detection::GestureSummary;
use crate::models::landmark::{HandCount, Landmark, LandmarkError, LandmarkResult, Observation, HAND_LANDMARK_COUNT};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Gesture
// ==============================================================================

/// A named category of hand pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gesture {
    pub id: String,
    /// Unique slug, e.g. `thank-you`
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub supports_dual_hand: bool,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Gesture {
    /// Hand count an observation must have to be compared against this gesture
    pub fn required_hand_count(&self) -> HandCount {
        if self.supports_dual_hand {
            HandCount::Two
        } else {
            HandCount::One
        }
    }

    pub fn summary(&self) -> GestureSummary {
        GestureSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            label: self.label.clone(),
            supports_dual_hand: self.supports_dual_hand,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGesture {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub supports_dual_hand: bool,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_active() -> bool {
    true
}

impl NewGesture {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: None,
            is_active: true,
            supports_dual_hand: false,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn dual_hand(mut self) -> Self {
        self.supports_dual_hand = true;
        self
    }

    /// Names are lowercase slugs: ascii letters, digits, `-` and `_`
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Gesture name cannot be empty".to_string());
        }
        let slug_like = self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !slug_like {
            return Err(format!(
                "Invalid gesture name: {}. Use lowercase letters, digits, '-' or '_'",
                self.name
            ));
        }
        if self.label.trim().is_empty() {
            return Err("Gesture label cannot be empty".to_string());
        }
        Ok(())
    }
}

// ==============================================================================
// Training Samples
// ==============================================================================

/// Landmark payload of a stored sample.
///
/// Single-hand samples serialize as a plain point array, dual-hand samples as
/// `{"left": [...], "right": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleLandmarks {
    Dual {
        left: Vec<Landmark>,
        right: Vec<Landmark>,
    },
    Single(Vec<Landmark>),
}

impl SampleLandmarks {
    pub fn hand_count(&self) -> HandCount {
        match self {
            SampleLandmarks::Single(_) => HandCount::One,
            SampleLandmarks::Dual { .. } => HandCount::Two,
        }
    }

    /// Structural check applied before a sample is stored
    pub fn validate(&self) -> LandmarkResult<()> {
        let check = |points: &[Landmark]| {
            if points.len() < HAND_LANDMARK_COUNT {
                return Err(LandmarkError::TooFewPoints {
                    expected: HAND_LANDMARK_COUNT,
                    actual: points.len(),
                });
            }
            Ok(())
        };

        match self {
            SampleLandmarks::Single(points) => check(points),
            SampleLandmarks::Dual { left, right } => {
                check(left)?;
                check(right)
            }
        }
    }
}

impl From<&Observation> for SampleLandmarks {
    fn from(observation: &Observation) -> Self {
        match observation {
            Observation::Single(hand) => SampleLandmarks::Single(hand.landmarks.points().to_vec()),
            Observation::Dual { left, right } => SampleLandmarks::Dual {
                left: left.landmarks.points().to_vec(),
                right: right.landmarks.points().to_vec(),
            },
        }
    }
}

/// A stored, labeled reference pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub id: String,
    pub gesture_id: String,
    pub landmarks: SampleLandmarks,
    /// Cached wrist-relative normalized form of `landmarks`
    pub normalized: Option<SampleLandmarks>,
    pub hand_count: HandCount,
    /// How good the sample is, in `[0, 1]`
    pub confidence_score: f64,
    pub is_validated: bool,
    pub notes: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrainingSample {
    pub landmarks: SampleLandmarks,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub is_validated: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl NewTrainingSample {
    pub fn new(landmarks: SampleLandmarks, confidence_score: f64) -> Self {
        Self {
            landmarks,
            confidence_score,
            is_validated: false,
            notes: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn validated(mut self) -> Self {
        self.is_validated = true;
        self
    }
}

/// A gesture together with the samples it is matched through
#[derive(Debug, Clone, PartialEq)]
pub struct GestureCandidate {
    pub gesture: Gesture,
    pub samples: Vec<TrainingSample>,
}

impl GestureCandidate {
    /// Active and owning at least one validated sample
    pub fn is_trained(&self) -> bool {
        self.gesture.is_active && self.samples.iter().any(|s| s.is_validated)
    }
}
