//! Application settings model

use serde::{Deserialize, Serialize};

use super::record::{impl_sync_record, new_record_uuid};
use super::Table;

/// Unit used to display and enter weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    #[default]
    Kg,
    Lb,
}

/// Effort scale used by default on new sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RpeType {
    /// Rate of perceived exertion (1-10)
    #[default]
    Rpe,
    /// Reps in reserve
    Rir,
}

/// Theme mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow system preference
    #[default]
    System,
}

/// Application settings.
///
/// A singleton: merge matches it against the first local row instead of by
/// uuid. It still carries `uuid`/`updatedAt` so it can be versioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "super::record::null_as_empty")]
    pub uuid: String,
    #[serde(default)]
    pub mass_unit: MassUnit,
    /// Increment for the weight stepper, e.g. 2.5
    #[serde(default = "default_weight_step")]
    pub weight_step: f64,
    #[serde(default, rename = "defaultRPEType")]
    pub default_rpe_type: RpeType,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_language")]
    pub language: String,
    /// Settings written before versioning existed decode as 0 and lose every tie
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

const fn default_weight_step() -> f64 {
    2.5
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: None,
            uuid: new_record_uuid(),
            mass_unit: MassUnit::Kg,
            weight_step: default_weight_step(),
            default_rpe_type: RpeType::Rpe,
            theme: ThemeMode::System,
            language: default_language(),
            updated_at: crate::util::now_ms(),
            deleted_at: None,
        }
    }
}

impl_sync_record!(Settings, Table::Settings);
