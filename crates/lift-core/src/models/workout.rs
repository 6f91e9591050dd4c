//! Workout and workout-exercise models

use serde::{Deserialize, Serialize};

use super::record::{impl_sync_record, new_record_uuid};
use super::Table;

/// Self-reported mood for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Bad,
    Terrible,
}

/// A training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "super::record::null_as_empty")]
    pub uuid: String,
    /// Session start (Unix ms)
    pub started_at: i64,
    /// Calendar day label, e.g. `2024-05-01`
    pub workout_day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_weight: Option<f64>,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl Workout {
    /// Start a new workout now
    #[must_use]
    pub fn start() -> Self {
        let now = chrono::Utc::now();
        Self {
            id: None,
            uuid: new_record_uuid(),
            started_at: now.timestamp_millis(),
            workout_day: now.format("%Y-%m-%d").to_string(),
            ended_at: None,
            title: None,
            tags: Vec::new(),
            mood: None,
            notes: None,
            body_weight: None,
            updated_at: now.timestamp_millis(),
            deleted_at: None,
        }
    }
}

/// An exercise performed within a workout, linked by uuids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "super::record::null_as_empty")]
    pub uuid: String,
    /// Parent workout uuid
    pub workout_id: String,
    /// Exercise uuid
    pub exercise_id: String,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl WorkoutExercise {
    /// Attach an exercise to a workout at the given position
    #[must_use]
    pub fn new(workout_uuid: impl Into<String>, exercise_uuid: impl Into<String>, order: i64) -> Self {
        Self {
            id: None,
            uuid: new_record_uuid(),
            workout_id: workout_uuid.into(),
            exercise_id: exercise_uuid.into(),
            order,
            notes: None,
            updated_at: crate::util::now_ms(),
            deleted_at: None,
        }
    }
}

impl_sync_record!(Workout, Table::Workouts);
impl_sync_record!(WorkoutExercise, Table::WorkoutExercises);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workout_start_sets_day() {
        let workout = Workout::start();
        assert_eq!(workout.workout_day.len(), 10);
        assert_eq!(workout.started_at, workout.updated_at);
    }

    #[test]
    fn test_workout_exercise_references_uuids() {
        let workout = Workout::start();
        let link = WorkoutExercise::new(&workout.uuid, "exercise-uuid", 0);
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["workoutId"], workout.uuid.as_str());
        assert_eq!(value["exerciseId"], "exercise-uuid");
    }

    #[test]
    fn test_workout_defaults_missing_tags() {
        let json = r#"{"uuid":"w1","startedAt":1,"workoutDay":"2024-01-01","updatedAt":2}"#;
        let workout: Workout = serde_json::from_str(json).unwrap();
        assert!(workout.tags.is_empty());
        assert!(workout.id.is_none());
    }
}
