//! Workout template model

use serde::{Deserialize, Serialize};

use super::record::{impl_sync_record, new_record_uuid};
use super::Table;

/// A reusable, ordered list of exercises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "super::record::null_as_empty")]
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Exercise uuids in order
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default)]
    pub is_custom: bool,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl WorkoutTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>, exercises: Vec<String>) -> Self {
        Self {
            id: None,
            uuid: new_record_uuid(),
            name: name.into(),
            description: None,
            exercises,
            is_custom: true,
            updated_at: crate::util::now_ms(),
            deleted_at: None,
        }
    }
}

impl_sync_record!(WorkoutTemplate, Table::WorkoutTemplates);
