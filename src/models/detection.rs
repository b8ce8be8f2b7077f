// Data models for the detection request/response boundary and match outcomes

use crate::models::landmark::{HandCount, HandObservation, Handedness, Landmark, LandmarkError, LandmarkSet, Observation};
use serde::{Deserialize, Serialize};

/// A best score must be strictly greater than this to count as a match
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

pub fn meets_threshold(score: f64) -> bool {
    score > CONFIDENCE_THRESHOLD
}

/// Round a confidence to 4 decimal places for reporting
pub fn round_confidence(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

// ==============================================================================
// Detection Request
// ==============================================================================

/// Raw hand observation as posted by a detection client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    pub confidence: f64,
    pub hand_count: u8,
    #[serde(default)]
    pub hand_data: Option<Vec<HandData>>,
}

/// One tracked hand inside a multi-hand request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandData {
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub handedness: Option<Handedness>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl DetectRequest {
    /// Validate the payload and resolve it into a typed observation.
    ///
    /// Dual-hand entries are assigned by their handedness labels. When only
    /// one hand is labeled the other takes the opposite side; when no hand is
    /// labeled or both claim the same side, payload order (left first) is used.
    pub fn into_observation(self) -> DetectionResult<Observation> {
        check_confidence("confidence", self.confidence)?;
        let hand_count = HandCount::try_from(self.hand_count)?;

        match hand_count {
            HandCount::One => {
                let landmarks = LandmarkSet::try_from(self.landmarks)?;
                let handedness = self
                    .hand_data
                    .as_ref()
                    .and_then(|hands| hands.first())
                    .and_then(|hand| hand.handedness);
                Ok(Observation::Single(HandObservation {
                    landmarks,
                    handedness,
                    confidence: self.confidence,
                }))
            }
            HandCount::Two => {
                let hands = self.hand_data.unwrap_or_default();
                if hands.len() < 2 {
                    return Err(DetectionError::InvalidInput(format!(
                        "handCount 2 requires two entries in handData, got {}",
                        hands.len()
                    )));
                }

                let mut observations = Vec::with_capacity(2);
                for hand in hands.into_iter().take(2) {
                    let confidence = hand.confidence.unwrap_or(self.confidence);
                    check_confidence("handData.confidence", confidence)?;
                    observations.push(HandObservation {
                        landmarks: LandmarkSet::try_from(hand.landmarks)?,
                        handedness: hand.handedness,
                        confidence,
                    });
                }

                let second = observations.pop();
                let first = observations.pop();
                let (Some(first), Some(second)) = (first, second) else {
                    return Err(DetectionError::InvalidInput("handData is incomplete".to_string()));
                };

                // a single label still decides both sides
                let (left, right) = match (first.handedness, second.handedness) {
                    (Some(Handedness::Right), Some(Handedness::Left))
                    | (Some(Handedness::Right), None)
                    | (None, Some(Handedness::Left)) => (second, first),
                    _ => (first, second),
                };
                Ok(Observation::Dual { left, right })
            }
        }
    }
}

fn check_confidence(field: &str, value: f64) -> DetectionResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DetectionError::InvalidInput(format!(
            "{} must be between 0 and 1, got {}",
            field, value
        )));
    }
    Ok(())
}

// ==============================================================================
// Match Outcome
// ==============================================================================

/// Public identity of a gesture as reported to detection clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSummary {
    pub id: String,
    pub name: String,
    pub label: String,
    pub supports_dual_hand: bool,
}

/// Best similarity one gesture reached against a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub gesture: GestureSummary,
    /// Unrounded best sample similarity
    pub score: f64,
    pub samples_compared: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// No active gesture owns a validated sample
    NothingTrained,
    /// `best` is `None` when no sample was comparable with the query
    NoMatch {
        best: Option<CandidateScore>,
        ranked: Vec<CandidateScore>,
    },
    Matched {
        winner: CandidateScore,
        ranked: Vec<CandidateScore>,
    },
}

impl MatchOutcome {
    /// Best raw score found, 0 when nothing was compared
    pub fn best_score(&self) -> f64 {
        match self {
            MatchOutcome::NothingTrained => 0.0,
            MatchOutcome::NoMatch { best, .. } => best.as_ref().map_or(0.0, |b| b.score),
            MatchOutcome::Matched { winner, .. } => winner.score,
        }
    }

    pub fn meets_threshold(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }

    pub fn winner(&self) -> Option<&CandidateScore> {
        match self {
            MatchOutcome::Matched { winner, .. } => Some(winner),
            _ => None,
        }
    }

    pub fn ranked(&self) -> &[CandidateScore] {
        match self {
            MatchOutcome::NothingTrained => &[],
            MatchOutcome::NoMatch { ranked, .. } | MatchOutcome::Matched { ranked, .. } => ranked,
        }
    }
}

// ==============================================================================
// Detection Response
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectResponse {
    pub success: bool,
    pub gesture: Option<GestureSummary>,
    pub confidence: f64,
    pub threshold: f64,
    pub meets_threshold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateScore>,
}

impl DetectResponse {
    /// Generic failure returned when detection could not run at all
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            gesture: None,
            confidence: 0.0,
            threshold: CONFIDENCE_THRESHOLD,
            meets_threshold: false,
            message: Some(message.into()),
            candidates: Vec::new(),
        }
    }
}

impl From<MatchOutcome> for DetectResponse {
    fn from(outcome: MatchOutcome) -> Self {
        let confidence = round_confidence(outcome.best_score());
        match outcome {
            MatchOutcome::NothingTrained => Self {
                message: Some("No trained gestures available yet".to_string()),
                ..Self::failure("")
            },
            MatchOutcome::NoMatch { best, ranked } => {
                let message = match best {
                    Some(best) => format!(
                        "No gesture matched; closest was {} at {:.4}",
                        best.gesture.label, best.score
                    ),
                    None => "No gesture compatible with this hand count".to_string(),
                };
                Self {
                    success: false,
                    gesture: None,
                    confidence,
                    threshold: CONFIDENCE_THRESHOLD,
                    meets_threshold: false,
                    message: Some(message),
                    candidates: ranked,
                }
            }
            MatchOutcome::Matched { winner, ranked } => Self {
                success: true,
                gesture: Some(winner.gesture),
                confidence,
                threshold: CONFIDENCE_THRESHOLD,
                meets_threshold: true,
                message: None,
                candidates: ranked,
            },
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LandmarkError> for DetectionError {
    fn from(err: LandmarkError) -> Self {
        DetectionError::InvalidInput(err.to_string())
    }
}

pub type DetectionResult<T> = Result<T, DetectionError>;
