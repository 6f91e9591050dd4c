//! Exercise model

use serde::{Deserialize, Serialize};

use super::record::{impl_sync_record, new_record_uuid};
use super::Table;

/// Primary muscle group trained by an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Legs,
    Arms,
    Core,
    FullBody,
    Cardio,
    Other,
}

impl std::str::FromStr for MuscleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase()))
            .map_err(|_| format!("unknown muscle group '{s}'"))
    }
}

/// Movement pattern of an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Compound,
    Isolation,
    Isometric,
    Cardio,
}

/// An exercise in the user's catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Local row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Cross-device identity
    #[serde(default, deserialize_with = "super::record::null_as_empty")]
    pub uuid: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_type: Option<MovementType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// False for the built-in catalogue
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Last mutation (Unix ms)
    pub updated_at: i64,
    /// Tombstone (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_unilateral: Option<bool>,
}

impl Exercise {
    /// Create a new custom exercise
    #[must_use]
    pub fn new(name: impl Into<String>, muscle_group: MuscleGroup) -> Self {
        Self {
            id: None,
            uuid: new_record_uuid(),
            name: name.into(),
            muscle_group,
            movement_type: None,
            equipment: None,
            aliases: Vec::new(),
            is_custom: true,
            notes: None,
            updated_at: crate::util::now_ms(),
            deleted_at: None,
            is_unilateral: None,
        }
    }
}

impl_sync_record!(Exercise, Table::Exercises);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SyncRecord;

    #[test]
    fn test_exercise_new() {
        let exercise = Exercise::new("Front Squat", MuscleGroup::Legs);
        assert!(exercise.is_custom);
        assert!(exercise.id.is_none());
        assert!(!exercise.uuid.is_empty());
        assert!(!exercise.is_deleted());
    }

    #[test]
    fn test_exercise_json_uses_camel_case() {
        let exercise = Exercise::new("Plank", MuscleGroup::Core);
        let value = serde_json::to_value(&exercise).unwrap();
        assert_eq!(value["muscleGroup"], "core");
        assert_eq!(value["isCustom"], true);
        assert!(value.get("id").is_none());
        assert!(value.get("deletedAt").is_none());
    }

    #[test]
    fn test_muscle_group_from_str() {
        assert_eq!(
            "full_body".parse::<MuscleGroup>().unwrap(),
            MuscleGroup::FullBody
        );
        assert_eq!(" Legs ".parse::<MuscleGroup>().unwrap(), MuscleGroup::Legs);
        assert!("wings".parse::<MuscleGroup>().is_err());
    }
}
