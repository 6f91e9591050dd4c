//! Snapshot codec
//!
//! A snapshot is one self-describing JSON document holding every syncable
//! table of the local store. It is what providers move around.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{RecordRepository, SqliteRecordRepository};
use crate::error::{Error, Result};
use crate::models::{
    ConflictRecord, Exercise, SetEntry, Settings, SyncRecord, Workout, WorkoutExercise,
    WorkoutTemplate,
};

/// Version of the record shapes inside `data`. Bump on incompatible changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Full serialization of the local store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub schema_version: u32,
    /// Export time (Unix ms)
    pub exported_at: i64,
    /// Installation that produced the snapshot; informational only
    pub device_id: String,
    pub data: SnapshotData,
}

/// Records of every table, keyed by snapshot table name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub settings: Vec<Settings>,
    pub exercises: Vec<Exercise>,
    pub workouts: Vec<Workout>,
    pub workout_exercises: Vec<WorkoutExercise>,
    pub sets: Vec<SetEntry>,
    #[serde(default)]
    pub conflict_log: Vec<ConflictRecord>,
    #[serde(default)]
    pub workout_templates: Vec<WorkoutTemplate>,
}

impl Snapshot {
    /// Total number of records across all tables
    pub fn record_count(&self) -> usize {
        let data = &self.data;
        data.settings.len()
            + data.exercises.len()
            + data.workouts.len()
            + data.workout_exercises.len()
            + data.sets.len()
            + data.conflict_log.len()
            + data.workout_templates.len()
    }

    /// Fail with `SchemaMismatch` unless this build understands the snapshot
    pub const fn ensure_compatible(&self) -> Result<()> {
        if self.schema_version == SCHEMA_VERSION {
            Ok(())
        } else {
            Err(Error::SchemaMismatch {
                expected: SCHEMA_VERSION,
                found: self.schema_version,
            })
        }
    }
}

/// Read every syncable table in full.
///
/// Runs in one read transaction; nothing is written.
pub fn create_snapshot(conn: &Connection, device_id: &str, exported_at: i64) -> Result<Snapshot> {
    let tx = conn.unchecked_transaction()?;
    let data = SnapshotData {
        settings: read_table(&tx)?,
        exercises: read_table(&tx)?,
        workouts: read_table(&tx)?,
        workout_exercises: read_table(&tx)?,
        sets: read_table(&tx)?,
        conflict_log: read_table(&tx)?,
        workout_templates: read_table(&tx)?,
    };
    tx.commit()?;

    Ok(Snapshot {
        schema_version: SCHEMA_VERSION,
        exported_at,
        device_id: device_id.to_string(),
        data,
    })
}

fn read_table<T: SyncRecord>(conn: &Connection) -> Result<Vec<T>> {
    SqliteRecordRepository::<T>::new(conn).list_all()
}

/// Parse snapshot bytes.
///
/// A document that fails to decode but declares a different schema version
/// reports `SchemaMismatch` rather than `MalformedSnapshot`, since the
/// shape change is the likely cause.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    match serde_json::from_slice::<Snapshot>(bytes) {
        Ok(snapshot) => Ok(snapshot),
        Err(error) => {
            if let Ok(header) = serde_json::from_slice::<SnapshotHeader>(bytes) {
                if header.schema_version != SCHEMA_VERSION {
                    return Err(Error::SchemaMismatch {
                        expected: SCHEMA_VERSION,
                        found: header.schema_version,
                    });
                }
            }
            Err(Error::MalformedSnapshot(error.to_string()))
        }
    }
}

/// Encode a snapshot as pretty-printed JSON
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(snapshot)?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotHeader {
    schema_version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed_defaults, Database};
    use crate::models::{MuscleGroup, SetEntry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_snapshot_includes_every_table() {
        let db = Database::open_in_memory().unwrap();
        let snapshot = create_snapshot(db.connection(), "device-a", 42).unwrap();

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["exportedAt"], 42);
        assert_eq!(value["deviceId"], "device-a");
        for key in [
            "settings",
            "exercises",
            "workouts",
            "workoutExercises",
            "sets",
            "conflictLog",
            "workoutTemplates",
        ] {
            assert!(value["data"][key].is_array(), "missing table {key}");
        }
        assert_eq!(snapshot.record_count(), 0);
    }

    #[test]
    fn test_round_trip_preserves_every_record() {
        let mut db = Database::open_in_memory().unwrap();
        seed_defaults(db.connection_mut()).unwrap();

        let conn = db.connection();
        let exercise = SqliteRecordRepository::<Exercise>::new(conn)
            .insert(&Exercise::new("Zercher Squat", MuscleGroup::Legs))
            .unwrap();
        let mut set = SetEntry::new("we-1", 0, 102.5, 3);
        set.rpe = Some(9.5);
        set.deleted_at = Some(set.updated_at);
        SqliteRecordRepository::<SetEntry>::new(conn)
            .insert(&set)
            .unwrap();

        let snapshot = create_snapshot(conn, "device-a", 1_700_000_000_000).unwrap();
        let parsed = parse_snapshot(&encode_snapshot(&snapshot).unwrap()).unwrap();

        assert_eq!(parsed, snapshot);
        assert!(parsed.data.exercises.contains(&exercise));
        assert_eq!(parsed.data.sets[0].deleted_at, Some(set.updated_at));
    }

    #[test]
    fn test_parse_defaults_optional_tables() {
        let json = br#"{
            "schemaVersion": 1,
            "exportedAt": 1,
            "deviceId": "d",
            "data": {"settings": [], "exercises": [], "workouts": [], "workoutExercises": [], "sets": []}
        }"#;
        let snapshot = parse_snapshot(json).unwrap();
        assert!(snapshot.data.conflict_log.is_empty());
        assert!(snapshot.data.workout_templates.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_table() {
        let json = br#"{"schemaVersion": 1, "exportedAt": 1, "deviceId": "d", "data": {"settings": []}}"#;
        assert!(matches!(
            parse_snapshot(json),
            Err(Error::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_snapshot(b"not json"),
            Err(Error::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_parse_reports_schema_mismatch_for_future_shape() {
        let json = br#"{"schemaVersion": 2, "exportedAt": 1, "deviceId": "d", "tables": {}}"#;
        assert!(matches!(
            parse_snapshot(json),
            Err(Error::SchemaMismatch {
                expected: SCHEMA_VERSION,
                found: 2
            })
        ));
    }

    #[test]
    fn test_ensure_compatible() {
        let db = Database::open_in_memory().unwrap();
        let mut snapshot = create_snapshot(db.connection(), "d", 0).unwrap();
        assert!(snapshot.ensure_compatible().is_ok());

        snapshot.schema_version = SCHEMA_VERSION + 1;
        assert!(matches!(
            snapshot.ensure_compatible(),
            Err(Error::SchemaMismatch { .. })
        ));
    }
}
