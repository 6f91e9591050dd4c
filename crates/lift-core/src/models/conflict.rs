//! Sync conflict log model

use serde::{Deserialize, Serialize};

use super::record::impl_sync_record;
use super::Table;

/// Kind of record a conflict entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Workout,
    Exercise,
    Set,
    WorkoutExercise,
    WorkoutTemplate,
    Settings,
}

/// Which side's version was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Local,
    Remote,
    Manual,
}

/// Conflict observed while merging, kept for manual review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "super::record::null_as_empty")]
    pub uuid: String,
    pub entity_type: EntityType,
    /// Uuid of the conflicting record
    pub entity_id: String,
    pub local_updated_at: i64,
    pub remote_updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    /// Losing side's record as JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl_sync_record!(ConflictRecord, Table::ConflictLog);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_parses_original_shape() {
        let json = r#"{
            "uuid": "c1",
            "entityType": "workout_exercise",
            "entityId": "we-1",
            "localUpdatedAt": 100,
            "remoteUpdatedAt": 100,
            "resolution": "manual",
            "snapshot": {"order": 2}
        }"#;
        let conflict: ConflictRecord = serde_json::from_str(json).unwrap();
        assert_eq!(conflict.entity_type, EntityType::WorkoutExercise);
        assert_eq!(conflict.resolution, Some(Resolution::Manual));
        assert_eq!(conflict.updated_at, 0);
    }
}
