// Gesture readiness and quality scoring over the stored sample collection

use crate::models::gesture::{Gesture, TrainingSample};
use serde::{Deserialize, Serialize};

/// Validated samples a gesture needs before it is considered ready
pub const DEFAULT_MINIMUM_SAMPLES: u32 = 5;

/// Validated sample count at which the sample score saturates
pub const SAMPLE_SCORE_SATURATION: f64 = 10.0;

const VALIDATION_WEIGHT: f64 = 0.4;
const SAMPLE_WEIGHT: f64 = 0.3;
const CONFIDENCE_WEIGHT: f64 = 0.3;

/// Aggregate statistics over all samples of one gesture
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleStatistics {
    pub total_samples: u32,
    pub validated_samples: u32,
    /// Mean confidence over all samples, validated or not
    pub average_confidence: f64,
    pub best_confidence: f64,
}

#[cfg(test)]
impl SampleStatistics {
    pub fn from_samples(samples: &[TrainingSample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let total_samples = samples.len() as u32;
        let validated_samples = samples.iter().filter(|s| s.is_validated).count() as u32;
        let sum: f64 = samples.iter().map(|s| s.confidence_score).sum();
        let best_confidence = samples
            .iter()
            .map(|s| s.confidence_score)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            total_samples,
            validated_samples,
            average_confidence: sum / total_samples as f64,
            best_confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub gesture_id: String,
    pub gesture_name: String,
    pub total_samples: u32,
    pub validated_samples: u32,
    /// Percentage of samples that are validated, 0..=100
    pub validation_rate: f64,
    pub sample_score: f64,
    pub confidence_score: f64,
    pub average_confidence: f64,
    pub best_confidence: f64,
    pub quality_score: f64,
    pub minimum_samples: u32,
    pub is_ready: bool,
}

/// Combine sample statistics into a quality score and a readiness gate.
///
/// The score and the gate are independent: a gesture below
/// `minimum_samples` can still have a non-zero quality score.
pub fn evaluate_quality(gesture: &Gesture, stats: &SampleStatistics, minimum_samples: u32) -> QualityReport {
    let validated = stats.validated_samples as f64;

    let validation_rate = if stats.total_samples == 0 {
        0.0
    } else {
        validated / stats.total_samples as f64 * 100.0
    };
    let sample_score = (validated / SAMPLE_SCORE_SATURATION * 100.0).min(100.0);
    let confidence_score = stats.average_confidence * 100.0;
    let quality_score =
        VALIDATION_WEIGHT * validation_rate + SAMPLE_WEIGHT * sample_score + CONFIDENCE_WEIGHT * confidence_score;

    QualityReport {
        gesture_id: gesture.id.clone(),
        gesture_name: gesture.name.clone(),
        total_samples: stats.total_samples,
        validated_samples: stats.validated_samples,
        validation_rate,
        sample_score,
        confidence_score,
        average_confidence: stats.average_confidence,
        best_confidence: stats.best_confidence,
        quality_score,
        minimum_samples,
        is_ready: gesture.is_active && stats.validated_samples >= minimum_samples,
    }
}
