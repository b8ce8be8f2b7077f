// Gesture and training sample storage, and the candidate source used for matching

use crate::core::database::Database;
use crate::core::normalizer::{normalize_sample, NormalizationMethod};
use crate::core::quality_evaluator::SampleStatistics;
use crate::models::gesture::{Gesture, GestureCandidate, NewGesture, NewTrainingSample, SampleLandmarks, TrainingSample};
use crate::models::landmark::{HandCount, LandmarkError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// Errors
// ==============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid landmarks: {0}")]
    Landmarks(#[from] LandmarkError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ==============================================================================
// Candidate Source
// ==============================================================================

/// Read-only view of the trained gesture library.
///
/// Returns every active gesture with its validated samples, as one snapshot
/// for the duration of a match.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn load_candidates(&self) -> StoreResult<Vec<GestureCandidate>>;
}

/// A fixed in-memory library
#[derive(Debug, Clone, Default)]
pub struct CandidateSnapshot {
    candidates: Vec<GestureCandidate>,
}

impl CandidateSnapshot {
    pub fn new(candidates: Vec<GestureCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl CandidateSource for CandidateSnapshot {
    async fn load_candidates(&self) -> StoreResult<Vec<GestureCandidate>> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.gesture.is_active)
            .map(|c| GestureCandidate {
                gesture: c.gesture.clone(),
                samples: c.samples.iter().filter(|s| s.is_validated).cloned().collect(),
            })
            .collect())
    }
}

// ==============================================================================
// Database Row Types
// ==============================================================================

#[derive(Debug, sqlx::FromRow)]
struct GestureRow {
    id: String,
    name: String,
    label: String,
    description: Option<String>,
    is_active: bool,
    supports_dual_hand: bool,
    metadata_json: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<GestureRow> for Gesture {
    type Error = StoreError;

    fn try_from(row: GestureRow) -> StoreResult<Self> {
        Ok(Gesture {
            id: row.id,
            name: row.name,
            label: row.label,
            description: row.description,
            is_active: row.is_active,
            supports_dual_hand: row.supports_dual_hand,
            metadata: parse_metadata(row.metadata_json)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SampleRow {
    id: String,
    gesture_id: String,
    landmarks_json: String,
    normalized_json: Option<String>,
    hand_count: i64,
    confidence_score: f64,
    is_validated: bool,
    notes: Option<String>,
    metadata_json: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SampleRow> for TrainingSample {
    type Error = StoreError;

    fn try_from(row: SampleRow) -> StoreResult<Self> {
        let landmarks: SampleLandmarks = serde_json::from_str(&row.landmarks_json)?;
        let normalized = row
            .normalized_json
            .map(|json| serde_json::from_str::<SampleLandmarks>(&json))
            .transpose()?;
        let hand_count = HandCount::try_from(row.hand_count)?;

        if landmarks.hand_count() != hand_count {
            return Err(StoreError::InvalidData(format!(
                "sample {} declares {} hand(s) but stores {}",
                row.id,
                u8::from(hand_count),
                u8::from(landmarks.hand_count())
            )));
        }

        Ok(TrainingSample {
            id: row.id,
            gesture_id: row.gesture_id,
            landmarks,
            normalized,
            hand_count,
            confidence_score: row.confidence_score,
            is_validated: row.is_validated,
            notes: row.notes,
            metadata: parse_metadata(row.metadata_json)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatisticsRow {
    total_samples: i64,
    validated_samples: Option<i64>,
    average_confidence: Option<f64>,
    best_confidence: Option<f64>,
}

fn parse_metadata(json: Option<String>) -> StoreResult<serde_json::Value> {
    match json {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(serde_json::Value::Null),
    }
}

fn metadata_json(metadata: &serde_json::Value) -> StoreResult<Option<String>> {
    if metadata.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(metadata)?))
}

// ==============================================================================
// Gesture Store
// ==============================================================================

pub struct GestureStore {
    db: Arc<Database>,
}

impl GestureStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new gesture definition
    pub async fn create_gesture(&self, new: NewGesture) -> StoreResult<Gesture> {
        new.validate().map_err(StoreError::InvalidData)?;

        let now = chrono::Utc::now().timestamp_millis();
        let gesture = Gesture {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            label: new.label,
            description: new.description,
            is_active: new.is_active,
            supports_dual_hand: new.supports_dual_hand,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO gestures (
                id, name, label, description, is_active, supports_dual_hand,
                metadata_json, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&gesture.id)
        .bind(&gesture.name)
        .bind(&gesture.label)
        .bind(&gesture.description)
        .bind(gesture.is_active)
        .bind(gesture.supports_dual_hand)
        .bind(metadata_json(&gesture.metadata)?)
        .bind(gesture.created_at)
        .bind(gesture.updated_at)
        .execute(self.db.pool())
        .await?;

        tracing::info!(gesture = %gesture.name, dual = gesture.supports_dual_hand, "gesture created");
        Ok(gesture)
    }

    /// Get a gesture by ID
    pub async fn get_gesture(&self, id: &str) -> StoreResult<Gesture> {
        let row = sqlx::query_as::<_, GestureRow>("SELECT * FROM gestures WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("gesture {}", id)))?;

        row.try_into()
    }

    /// List all gestures, active or not
    pub async fn list_gestures(&self) -> StoreResult<Vec<Gesture>> {
        let rows = sqlx::query_as::<_, GestureRow>("SELECT * FROM gestures ORDER BY created_at ASC, rowid ASC")
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(Gesture::try_from).collect()
    }

    pub async fn set_gesture_active(&self, id: &str, is_active: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE gestures SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(chrono::Utc::now().timestamp_millis())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("gesture {}", id)));
        }
        Ok(())
    }

    /// Delete a gesture together with all of its samples
    pub async fn delete_gesture(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM gestures WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("gesture {}", id)));
        }
        tracing::info!(gesture_id = id, "gesture deleted");
        Ok(())
    }

    /// Store a new training sample.
    ///
    /// The raw landmarks are validated against the gesture's hand requirement
    /// and stored alongside their normalized form.
    pub async fn add_sample(&self, gesture_id: &str, new: NewTrainingSample) -> StoreResult<TrainingSample> {
        let gesture = self.get_gesture(gesture_id).await?;

        new.landmarks.validate()?;
        let hand_count = new.landmarks.hand_count();
        if hand_count != gesture.required_hand_count() {
            return Err(StoreError::InvalidData(format!(
                "gesture {} expects {} hand(s), sample has {}",
                gesture.name,
                u8::from(gesture.required_hand_count()),
                u8::from(hand_count)
            )));
        }
        if !(0.0..=1.0).contains(&new.confidence_score) {
            return Err(StoreError::InvalidData(format!(
                "confidence score must be between 0 and 1, got {}",
                new.confidence_score
            )));
        }

        let normalized = normalize_sample(&new.landmarks, NormalizationMethod::WristToMiddleTip);
        let now = chrono::Utc::now().timestamp_millis();
        let sample = TrainingSample {
            id: Uuid::new_v4().to_string(),
            gesture_id: gesture.id.clone(),
            landmarks: new.landmarks,
            normalized: Some(normalized),
            hand_count,
            confidence_score: new.confidence_score,
            is_validated: new.is_validated,
            notes: new.notes,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO training_samples (
                id, gesture_id, landmarks_json, normalized_json, hand_count,
                confidence_score, is_validated, notes, metadata_json, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sample.id)
        .bind(&sample.gesture_id)
        .bind(serde_json::to_string(&sample.landmarks)?)
        .bind(sample.normalized.as_ref().map(serde_json::to_string).transpose()?)
        .bind(u8::from(sample.hand_count) as i64)
        .bind(sample.confidence_score)
        .bind(sample.is_validated)
        .bind(&sample.notes)
        .bind(metadata_json(&sample.metadata)?)
        .bind(sample.created_at)
        .bind(sample.updated_at)
        .execute(self.db.pool())
        .await?;

        tracing::debug!(sample_id = %sample.id, gesture = %gesture.name, "training sample stored");
        Ok(sample)
    }

    pub async fn get_sample(&self, id: &str) -> StoreResult<TrainingSample> {
        let row = sqlx::query_as::<_, SampleRow>("SELECT * FROM training_samples WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("sample {}", id)))?;

        row.try_into()
    }

    /// All samples of a gesture, oldest first
    pub async fn list_samples(&self, gesture_id: &str) -> StoreResult<Vec<TrainingSample>> {
        let rows = sqlx::query_as::<_, SampleRow>(
            "SELECT * FROM training_samples WHERE gesture_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(gesture_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(TrainingSample::try_from).collect()
    }

    pub async fn set_sample_validated(&self, id: &str, is_validated: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE training_samples SET is_validated = ?, updated_at = ? WHERE id = ?")
            .bind(is_validated)
            .bind(chrono::Utc::now().timestamp_millis())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("sample {}", id)));
        }
        Ok(())
    }

    pub async fn update_sample_notes(&self, id: &str, notes: Option<&str>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE training_samples SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(notes)
            .bind(chrono::Utc::now().timestamp_millis())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("sample {}", id)));
        }
        Ok(())
    }

    pub async fn delete_sample(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM training_samples WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("sample {}", id)));
        }
        Ok(())
    }

    /// Sample counts and confidence aggregates for one gesture
    pub async fn sample_statistics(&self, gesture_id: &str) -> StoreResult<SampleStatistics> {
        let row = sqlx::query_as::<_, StatisticsRow>(
            r#"
            SELECT
                COUNT(*) as total_samples,
                SUM(is_validated) as validated_samples,
                AVG(confidence_score) as average_confidence,
                MAX(confidence_score) as best_confidence
            FROM training_samples
            WHERE gesture_id = ?
            "#,
        )
        .bind(gesture_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(SampleStatistics {
            total_samples: row.total_samples as u32,
            validated_samples: row.validated_samples.unwrap_or(0) as u32,
            average_confidence: row.average_confidence.unwrap_or(0.0),
            best_confidence: row.best_confidence.unwrap_or(0.0),
        })
    }

    /// Fill in a missing normalized cache. A concurrent writer storing the
    /// same derived value first is harmless.
    async fn backfill_normalized(&self, sample: &mut TrainingSample) -> StoreResult<()> {
        let normalized = normalize_sample(&sample.landmarks, NormalizationMethod::WristToMiddleTip);

        sqlx::query("UPDATE training_samples SET normalized_json = ? WHERE id = ? AND normalized_json IS NULL")
            .bind(serde_json::to_string(&normalized)?)
            .bind(&sample.id)
            .execute(self.db.pool())
            .await?;

        sample.normalized = Some(normalized);
        Ok(())
    }
}

#[async_trait]
impl CandidateSource for GestureStore {
    async fn load_candidates(&self) -> StoreResult<Vec<GestureCandidate>> {
        let gesture_rows = sqlx::query_as::<_, GestureRow>(
            "SELECT * FROM gestures WHERE is_active = 1 ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        let sample_rows = sqlx::query_as::<_, SampleRow>(
            r#"
            SELECT s.* FROM training_samples s
            JOIN gestures g ON g.id = s.gesture_id
            WHERE g.is_active = 1 AND s.is_validated = 1
            ORDER BY s.created_at ASC, s.rowid ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut samples_by_gesture: HashMap<String, Vec<TrainingSample>> = HashMap::new();
        for row in sample_rows {
            let sample_id = row.id.clone();
            let mut sample = match TrainingSample::try_from(row) {
                Ok(sample) => sample,
                Err(e) => {
                    tracing::warn!(sample_id = %sample_id, error = %e, "skipping undecodable training sample");
                    continue;
                }
            };
            if sample.normalized.is_none() {
                if let Err(e) = self.backfill_normalized(&mut sample).await {
                    tracing::warn!(sample_id = %sample.id, error = %e, "could not cache normalized landmarks");
                }
            }
            samples_by_gesture.entry(sample.gesture_id.clone()).or_default().push(sample);
        }

        let mut candidates = Vec::with_capacity(gesture_rows.len());
        for row in gesture_rows {
            let gesture = Gesture::try_from(row)?;
            let samples = samples_by_gesture.remove(&gesture.id).unwrap_or_default();
            candidates.push(GestureCandidate { gesture, samples });
        }

        tracing::debug!(gestures = candidates.len(), "loaded gesture candidates");
        Ok(candidates)
    }
}
