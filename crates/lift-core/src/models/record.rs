//! Sync metadata convention shared by every stored record

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::EntityType;

/// A syncable table of the local store.
///
/// `ALL` lists the tables in merge order: parents before the rows that
/// reference them by uuid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    Settings,
    Exercises,
    Workouts,
    WorkoutExercises,
    Sets,
    WorkoutTemplates,
    ConflictLog,
}

impl Table {
    pub const ALL: [Self; 7] = [
        Self::Settings,
        Self::Exercises,
        Self::Workouts,
        Self::WorkoutExercises,
        Self::Sets,
        Self::WorkoutTemplates,
        Self::ConflictLog,
    ];

    /// Name of the backing `SQLite` table
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Exercises => "exercises",
            Self::Workouts => "workouts",
            Self::WorkoutExercises => "workout_exercises",
            Self::Sets => "sets",
            Self::WorkoutTemplates => "workout_templates",
            Self::ConflictLog => "conflict_log",
        }
    }

    /// Key of the table inside a snapshot's `data` object
    pub const fn snapshot_key(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Exercises => "exercises",
            Self::Workouts => "workouts",
            Self::WorkoutExercises => "workoutExercises",
            Self::Sets => "sets",
            Self::WorkoutTemplates => "workoutTemplates",
            Self::ConflictLog => "conflictLog",
        }
    }

    /// Entity type used when logging a conflict on a row of this table.
    ///
    /// The conflict log itself has none.
    pub const fn entity_type(self) -> Option<EntityType> {
        match self {
            Self::Settings => Some(EntityType::Settings),
            Self::Exercises => Some(EntityType::Exercise),
            Self::Workouts => Some(EntityType::Workout),
            Self::WorkoutExercises => Some(EntityType::WorkoutExercise),
            Self::Sets => Some(EntityType::Set),
            Self::WorkoutTemplates => Some(EntityType::WorkoutTemplate),
            Self::ConflictLog => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.snapshot_key())
    }
}

/// Accessors every syncable record provides.
///
/// `id` is the device-local row id and never crosses a sync boundary in a
/// meaningful way; `uuid` is the cross-device identity.
pub trait SyncRecord:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync
{
    const TABLE: Table;

    fn local_id(&self) -> Option<i64>;
    fn set_local_id(&mut self, id: Option<i64>);
    fn uuid(&self) -> &str;
    fn updated_at(&self) -> i64;
    fn set_updated_at(&mut self, updated_at: i64);
    fn deleted_at(&self) -> Option<i64>;
    fn set_deleted_at(&mut self, deleted_at: Option<i64>);

    /// Whether the record carries a tombstone
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

macro_rules! impl_sync_record {
    ($ty:ty, $table:expr) => {
        impl $crate::models::SyncRecord for $ty {
            const TABLE: $crate::models::Table = $table;

            fn local_id(&self) -> Option<i64> {
                self.id
            }

            fn set_local_id(&mut self, id: Option<i64>) {
                self.id = id;
            }

            fn uuid(&self) -> &str {
                &self.uuid
            }

            fn updated_at(&self) -> i64 {
                self.updated_at
            }

            fn set_updated_at(&mut self, updated_at: i64) {
                self.updated_at = updated_at;
            }

            fn deleted_at(&self) -> Option<i64> {
                self.deleted_at
            }

            fn set_deleted_at(&mut self, deleted_at: Option<i64>) {
                self.deleted_at = deleted_at;
            }
        }
    };
}

pub(crate) use impl_sync_record;

/// Reads a `null` uuid as empty so merge can skip the record instead of
/// the whole snapshot failing to decode
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fresh cross-device identity for a locally created record (UUID v7, time-sortable)
pub fn new_record_uuid() -> String {
    uuid::Uuid::now_v7().to_string()
}
