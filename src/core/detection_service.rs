// Detection pipeline: request validation, candidate loading and matching

use crate::core::gesture_matcher::GestureMatcher;
use crate::core::gesture_store::{CandidateSource, GestureStore, StoreError};
use crate::models::detection::{DetectRequest, DetectResponse, DetectionError, DetectionResult, MatchOutcome};
use crate::models::gesture::{NewTrainingSample, SampleLandmarks};
use crate::models::landmark::Observation;
use std::sync::Arc;

impl From<StoreError> for DetectionError {
    fn from(err: StoreError) -> Self {
        DetectionError::Storage(err.to_string())
    }
}

pub struct DetectionService {
    source: Arc<dyn CandidateSource>,
    matcher: GestureMatcher,
    /// Store that receives confident detections as new unvalidated samples
    sample_sink: Option<Arc<GestureStore>>,
}

impl DetectionService {
    pub fn new(source: Arc<dyn CandidateSource>, matcher: GestureMatcher) -> Self {
        Self {
            source,
            matcher,
            sample_sink: None,
        }
    }

    pub fn with_sample_sink(mut self, store: Arc<GestureStore>) -> Self {
        self.sample_sink = Some(store);
        self
    }

    /// Run one detection.
    ///
    /// Malformed requests fail with `InvalidInput` before any storage
    /// access. Every outcome of a well-formed request, including "nothing
    /// trained" and "no match", is a response rather than an error.
    pub async fn detect(&self, request: DetectRequest) -> DetectionResult<DetectResponse> {
        let observation = request.into_observation()?;
        let candidates = self.source.load_candidates().await?;

        let outcome = self.matcher.match_observation(&observation, &candidates);
        match &outcome {
            MatchOutcome::Matched { winner, .. } => {
                tracing::info!(gesture = %winner.gesture.label, score = winner.score, "gesture detected");
                if let Some(store) = &self.sample_sink {
                    self.record_detection(store, &observation, &winner.gesture.id, winner.score).await;
                }
            }
            MatchOutcome::NoMatch { best, .. } => {
                tracing::debug!(best = ?best.as_ref().map(|b| b.score), "no gesture above threshold");
            }
            MatchOutcome::NothingTrained => {
                tracing::debug!("no trained gestures to match against");
            }
        }

        Ok(DetectResponse::from(outcome))
    }

    /// Store a confident detection for later review. Failures are logged
    /// and never affect the detection result.
    async fn record_detection(&self, store: &GestureStore, observation: &Observation, gesture_id: &str, score: f64) {
        let mut sample = NewTrainingSample::new(SampleLandmarks::from(observation), score);
        sample.notes = Some("auto-added from detection".to_string());

        match store.add_sample(gesture_id, sample).await {
            Ok(stored) => tracing::debug!(sample_id = %stored.id, "detection stored as unvalidated sample"),
            Err(e) => tracing::warn!(gesture_id, error = %e, "failed to store detection sample"),
        }
    }
}
