//! Set entry model

use serde::{Deserialize, Serialize};

use super::record::{impl_sync_record, new_record_uuid};
use super::Table;

/// Side trained on a unilateral set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// A single logged set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "super::record::null_as_empty")]
    pub uuid: String,
    /// Parent workout-exercise uuid
    pub workout_exercise_id: String,
    pub order: i64,
    pub weight: f64,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rir: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_sec: Option<u32>,
    #[serde(default)]
    pub is_warmup: bool,
    #[serde(default)]
    pub is_failure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_rep: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl SetEntry {
    /// Log a working set
    #[must_use]
    pub fn new(workout_exercise_uuid: impl Into<String>, order: i64, weight: f64, reps: u32) -> Self {
        Self {
            id: None,
            uuid: new_record_uuid(),
            workout_exercise_id: workout_exercise_uuid.into(),
            order,
            weight,
            reps,
            rpe: None,
            rir: None,
            rest_sec: None,
            is_warmup: false,
            is_failure: false,
            failure_rep: None,
            side: None,
            notes: None,
            updated_at: crate::util::now_ms(),
            deleted_at: None,
        }
    }

    /// Training volume of the set (weight x reps)
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

impl_sync_record!(SetEntry, Table::Sets);
