pub mod core;
pub mod models;

use anyhow::{bail, Context};
use crate::core::comparator::{self, SampleComparison};
use crate::core::config::Config;
use crate::core::database::Database;
use crate::core::detection_service::DetectionService;
use crate::core::gesture_matcher::{GestureMatcher, MatcherOptions};
use crate::core::gesture_store::GestureStore;
use crate::core::quality_evaluator::{evaluate_quality, QualityReport};
use models::detection::{DetectRequest, DetectResponse, DetectionError};
use models::gesture::{Gesture, NewGesture, NewTrainingSample, SampleLandmarks, TrainingSample};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

// Application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<GestureStore>,
    pub detection: DetectionService,
}

impl AppState {
    /// Open the database under the configured data directory
    pub async fn init(config: Config) -> anyhow::Result<Self> {
        let db_path = config.database_path();
        let db = Database::open(&db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        Ok(Self::with_database(config, db))
    }

    pub fn with_database(config: Config, db: Database) -> Self {
        let store = Arc::new(GestureStore::new(Arc::new(db)));
        let matcher = GestureMatcher::new(
            MatcherOptions::live_detection().with_max_ranked(config.max_ranked_candidates),
        );

        let mut detection = DetectionService::new(store.clone(), matcher);
        if config.auto_add_confident_samples {
            detection = detection.with_sample_sink(store.clone());
        }

        Self {
            config,
            store,
            detection,
        }
    }
}

// ==============================================================================
// Commands
// ==============================================================================

/// Detect a gesture. Malformed requests are errors; storage failures
/// surface as an unsuccessful response.
pub async fn detect_gesture(request: DetectRequest, state: &AppState) -> Result<DetectResponse, String> {
    match state.detection.detect(request).await {
        Ok(response) => Ok(response),
        Err(DetectionError::InvalidInput(msg)) => Err(format!("Invalid detection request: {}", msg)),
        Err(DetectionError::Storage(msg)) => {
            tracing::error!(error = %msg, "gesture detection failed");
            Ok(DetectResponse::failure("Failed to load trained gestures"))
        }
    }
}

pub async fn compare_samples(sample_a: &str, sample_b: &str, state: &AppState) -> Result<SampleComparison, String> {
    let a = state
        .store
        .get_sample(sample_a)
        .await
        .map_err(|e| format!("Failed to load sample: {}", e))?;
    let b = state
        .store
        .get_sample(sample_b)
        .await
        .map_err(|e| format!("Failed to load sample: {}", e))?;

    Ok(comparator::compare_samples(&a, &b))
}

pub async fn get_gesture_quality(
    gesture_id: &str,
    minimum_samples: Option<u32>,
    state: &AppState,
) -> Result<QualityReport, String> {
    let gesture = state
        .store
        .get_gesture(gesture_id)
        .await
        .map_err(|e| format!("Failed to load gesture: {}", e))?;
    let stats = state
        .store
        .sample_statistics(gesture_id)
        .await
        .map_err(|e| format!("Failed to load sample statistics: {}", e))?;

    let minimum = minimum_samples.unwrap_or(state.config.minimum_ready_samples);
    Ok(evaluate_quality(&gesture, &stats, minimum))
}

pub async fn list_gestures(state: &AppState) -> Result<Vec<Gesture>, String> {
    state
        .store
        .list_gestures()
        .await
        .map_err(|e| format!("Failed to list gestures: {}", e))
}

pub async fn create_gesture(gesture: NewGesture, state: &AppState) -> Result<Gesture, String> {
    state
        .store
        .create_gesture(gesture)
        .await
        .map_err(|e| format!("Failed to create gesture: {}", e))
}

pub async fn add_training_sample(
    gesture_id: &str,
    sample: NewTrainingSample,
    state: &AppState,
) -> Result<TrainingSample, String> {
    state
        .store
        .add_sample(gesture_id, sample)
        .await
        .map_err(|e| format!("Failed to add training sample: {}", e))
}

pub async fn set_sample_validation(sample_id: &str, is_validated: bool, state: &AppState) -> Result<(), String> {
    state
        .store
        .set_sample_validated(sample_id, is_validated)
        .await
        .map_err(|e| format!("Failed to update sample: {}", e))
}

// ==============================================================================
// Command Line
// ==============================================================================

const USAGE: &str = "usage: signsense <command>
  detect <request.json|->
  compare <sample-a> <sample-b>
  quality <gesture-id> [minimum-samples]
  gestures
  add-gesture <name> <label> [--dual]
  add-sample <gesture-id> <landmarks.json|-> [--validated]
  validate <sample-id> <true|false>";

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    if let Err(e) = crate::core::logging::init(&config.log_filter) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    let Some((command, rest)) = args.split_first() else {
        bail!("{}", USAGE);
    };
    let state = AppState::init(config).await?;

    match (command.as_str(), rest) {
        ("detect", [input]) => {
            let request: DetectRequest = serde_json::from_str(&read_input(input).await?)?;
            print_json(&detect_gesture(request, &state).await.map_err(anyhow::Error::msg)?)
        }
        ("compare", [a, b]) => print_json(&compare_samples(a, b, &state).await.map_err(anyhow::Error::msg)?),
        ("quality", [id, rest @ ..]) if rest.len() <= 1 => {
            let minimum = match rest.first() {
                Some(value) => Some(value.parse::<u32>().context("minimum-samples must be a number")?),
                None => None,
            };
            print_json(&get_gesture_quality(id, minimum, &state).await.map_err(anyhow::Error::msg)?)
        }
        ("gestures", []) => print_json(&list_gestures(&state).await.map_err(anyhow::Error::msg)?),
        ("add-gesture", [name, label, flags @ ..]) => {
            let mut gesture = NewGesture::new(name.as_str(), label.as_str());
            if flags.iter().any(|f| f == "--dual") {
                gesture = gesture.dual_hand();
            }
            print_json(&create_gesture(gesture, &state).await.map_err(anyhow::Error::msg)?)
        }
        ("add-sample", [gesture_id, input, flags @ ..]) => {
            let mut sample = parse_sample(&read_input(input).await?)?;
            if flags.iter().any(|f| f == "--validated") {
                sample.is_validated = true;
            }
            print_json(&add_training_sample(gesture_id, sample, &state).await.map_err(anyhow::Error::msg)?)
        }
        ("validate", [sample_id, value]) => {
            let is_validated: bool = value.parse().context("expected true or false")?;
            set_sample_validation(sample_id, is_validated, &state)
                .await
                .map_err(anyhow::Error::msg)?;
            print_json(&serde_json::json!({ "sample_id": sample_id, "is_validated": is_validated }))
        }
        _ => bail!("{}", USAGE),
    }
}

/// Read a file argument, or stdin for `-`
async fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut contents = String::new();
        tokio::io::stdin().read_to_string(&mut contents).await?;
        return Ok(contents);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path))
}

/// Accepts a full sample object, or a bare landmark payload stored at
/// confidence 1.0
fn parse_sample(json: &str) -> anyhow::Result<NewTrainingSample> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("landmarks").is_some() {
        return Ok(serde_json::from_value(value)?);
    }
    let landmarks: SampleLandmarks = serde_json::from_value(value)?;
    Ok(NewTrainingSample::new(landmarks, 1.0))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{fist, open_hand};
    use serde_json::json;

    async fn setup_state(auto_add: bool) -> AppState {
        let db = Database::in_memory().await.expect("Failed to create in-memory database");
        let config = Config {
            auto_add_confident_samples: auto_add,
            ..Config::default()
        };
        AppState::with_database(config, db)
    }

    fn detect_request(points: &[models::landmark::Landmark]) -> DetectRequest {
        serde_json::from_value(json!({ "landmarks": points, "confidence": 0.9, "handCount": 1 })).unwrap()
    }

    #[tokio::test]
    async fn test_train_then_detect() {
        let state = setup_state(false).await;
        let hello = create_gesture(NewGesture::new("hello", "Hello"), &state).await.unwrap();
        add_training_sample(
            &hello.id,
            NewTrainingSample::new(SampleLandmarks::Single(open_hand()), 0.9).validated(),
            &state,
        )
        .await
        .unwrap();

        let response = detect_gesture(detect_request(&open_hand()), &state).await.unwrap();
        assert!(response.success);
        assert_eq!(response.gesture.unwrap().label, "Hello");

        let miss = detect_gesture(detect_request(&fist()), &state).await.unwrap();
        assert!(!miss.success);
    }

    #[tokio::test]
    async fn test_detect_rejects_malformed_request() {
        let state = setup_state(false).await;
        let result = detect_gesture(detect_request(&open_hand()[..5]), &state).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_quality_and_validation_commands() {
        let state = setup_state(false).await;
        let hello = create_gesture(NewGesture::new("hello", "Hello"), &state).await.unwrap();
        let sample = add_training_sample(
            &hello.id,
            NewTrainingSample::new(SampleLandmarks::Single(open_hand()), 0.8),
            &state,
        )
        .await
        .unwrap();

        let report = get_gesture_quality(&hello.id, Some(1), &state).await.unwrap();
        assert_eq!(report.validated_samples, 0);
        assert!(!report.is_ready);

        set_sample_validation(&sample.id, true, &state).await.unwrap();
        let report = get_gesture_quality(&hello.id, Some(1), &state).await.unwrap();
        assert!(report.is_ready);
        assert!((report.validation_rate - 100.0).abs() < 1e-9);

        let default_minimum = get_gesture_quality(&hello.id, None, &state).await.unwrap();
        assert_eq!(default_minimum.minimum_samples, 5);
        assert!(!default_minimum.is_ready);

        assert!(get_gesture_quality("missing", None, &state).await.is_err());
    }

    #[tokio::test]
    async fn test_compare_samples_command() {
        let state = setup_state(false).await;
        let hello = create_gesture(NewGesture::new("hello", "Hello"), &state).await.unwrap();
        let a = add_training_sample(&hello.id, NewTrainingSample::new(SampleLandmarks::Single(open_hand()), 0.9), &state)
            .await
            .unwrap();
        let b = add_training_sample(&hello.id, NewTrainingSample::new(SampleLandmarks::Single(fist()), 0.9), &state)
            .await
            .unwrap();

        let comparison = compare_samples(&a.id, &b.id, &state).await.unwrap();
        assert!(comparison.similarity > 0.0 && comparison.similarity < 1.0);
        assert!(compare_samples(&a.id, "missing", &state).await.is_err());
    }

    #[tokio::test]
    async fn test_auto_add_follows_config() {
        let state = setup_state(true).await;
        let hello = create_gesture(NewGesture::new("hello", "Hello"), &state).await.unwrap();
        add_training_sample(
            &hello.id,
            NewTrainingSample::new(SampleLandmarks::Single(open_hand()), 0.9).validated(),
            &state,
        )
        .await
        .unwrap();

        detect_gesture(detect_request(&open_hand()), &state).await.unwrap();
        assert_eq!(state.store.list_samples(&hello.id).await.unwrap().len(), 2);
    }

    #[test]
    fn test_parse_sample_shapes() {
        let bare = parse_sample(&serde_json::to_string(&open_hand()).unwrap()).unwrap();
        assert_eq!(bare.confidence_score, 1.0);
        assert!(!bare.is_validated);

        let full = json!({ "landmarks": open_hand(), "confidence_score": 0.6, "is_validated": true });
        let parsed = parse_sample(&full.to_string()).unwrap();
        assert_eq!(parsed.confidence_score, 0.6);
        assert!(parsed.is_validated);
    }
}
