//! Default catalogue inserted into a fresh store

use crate::error::Result;
use crate::models::{Exercise, MovementType, MuscleGroup, Settings, WorkoutTemplate};
use rusqlite::Connection;
use uuid::Uuid;

use super::repository::{RecordRepository, SqliteRecordRepository};

const DEFAULT_EXERCISES: &[(&str, MuscleGroup, MovementType, bool)] = &[
    ("Squat (Barbell)", MuscleGroup::Legs, MovementType::Compound, false),
    ("Bench Press (Barbell)", MuscleGroup::Chest, MovementType::Compound, false),
    ("Deadlift (Barbell)", MuscleGroup::Back, MovementType::Compound, false),
    ("Overhead Press (Barbell)", MuscleGroup::Shoulders, MovementType::Compound, false),
    ("Pull Up", MuscleGroup::Back, MovementType::Compound, false),
    ("Dumbbell Row", MuscleGroup::Back, MovementType::Compound, true),
    ("Lunges", MuscleGroup::Legs, MovementType::Compound, true),
    ("Leg Press", MuscleGroup::Legs, MovementType::Compound, false),
    ("Lat Pulldown", MuscleGroup::Back, MovementType::Isolation, false),
    ("Bicep Curl (Dumbbell)", MuscleGroup::Arms, MovementType::Isolation, true),
    ("Tricep Extension", MuscleGroup::Arms, MovementType::Isolation, false),
    ("Plank", MuscleGroup::Core, MovementType::Isometric, false),
    ("Sit-Up", MuscleGroup::Core, MovementType::Compound, false),
    ("Bulgarian Split Squat", MuscleGroup::Legs, MovementType::Compound, true),
    ("Dips", MuscleGroup::Chest, MovementType::Compound, false),
    ("Calf Raise", MuscleGroup::Legs, MovementType::Isolation, false),
];

const DEFAULT_TEMPLATES: &[(&str, &str, &[&str])] = &[
    (
        "Upper Body",
        "Chest, back, and arms",
        &["Bench Press (Barbell)", "Pull Up", "Dips"],
    ),
    (
        "Lower Body",
        "Legs and glutes",
        &["Squat (Barbell)", "Bulgarian Split Squat", "Deadlift (Barbell)"],
    ),
    (
        "Full Body",
        "Complete workout",
        &["Squat (Barbell)", "Bench Press (Barbell)", "Pull Up", "Deadlift (Barbell)"],
    ),
];

/// Identity of a built-in record; the same on every device, so two seeded
/// stores merge instead of duplicating the catalogue
fn seed_uuid(kind: &str, name: &str) -> String {
    let key = format!("lift-seed:{kind}:{name}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

/// Insert default settings, exercises and templates into an empty store.
///
/// Returns `false` without writing anything when settings or exercises
/// already exist.
pub fn seed_defaults(conn: &mut Connection) -> Result<bool> {
    let tx = conn.transaction()?;
    {
        let settings = SqliteRecordRepository::<Settings>::new(&tx);
        let exercises = SqliteRecordRepository::<Exercise>::new(&tx);
        if settings.count()? > 0 || exercises.count()? > 0 {
            return Ok(false);
        }

        let mut defaults = Settings::default();
        defaults.uuid = seed_uuid("settings", "default");
        settings.insert(&defaults)?;

        let mut seeded = Vec::with_capacity(DEFAULT_EXERCISES.len());
        for &(name, muscle_group, movement_type, unilateral) in DEFAULT_EXERCISES {
            let mut exercise = Exercise::new(name, muscle_group);
            exercise.uuid = seed_uuid("exercise", name);
            exercise.movement_type = Some(movement_type);
            exercise.equipment = Some("gym".to_string());
            exercise.is_custom = false;
            if unilateral {
                exercise.is_unilateral = Some(true);
            }
            seeded.push(exercises.insert(&exercise)?);
        }

        let templates = SqliteRecordRepository::<WorkoutTemplate>::new(&tx);
        for &(name, description, members) in DEFAULT_TEMPLATES {
            let uuids = members
                .iter()
                .filter_map(|member| seeded.iter().find(|e| e.name == *member))
                .map(|exercise| exercise.uuid.clone())
                .collect();
            let mut template = WorkoutTemplate::new(name, uuids);
            template.uuid = seed_uuid("template", name);
            template.description = Some(description.to_string());
            template.is_custom = false;
            templates.insert(&template)?;
        }
    }
    tx.commit()?;

    tracing::info!(
        "Seeded {} default exercises and {} templates",
        DEFAULT_EXERCISES.len(),
        DEFAULT_TEMPLATES.len()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Table;
    use crate::sync::{create_snapshot, MergeEngine};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_seed_defaults_once() {
        let mut db = Database::open_in_memory().unwrap();

        assert!(seed_defaults(db.connection_mut()).unwrap());
        assert!(!seed_defaults(db.connection_mut()).unwrap());

        let conn = db.connection();
        assert_eq!(
            SqliteRecordRepository::<Exercise>::new(conn).count().unwrap(),
            DEFAULT_EXERCISES.len()
        );
        assert_eq!(
            SqliteRecordRepository::<Settings>::new(conn).count().unwrap(),
            1
        );
    }

    #[test]
    fn test_seeded_templates_reference_exercise_uuids() {
        let mut db = Database::open_in_memory().unwrap();
        seed_defaults(db.connection_mut()).unwrap();

        let conn = db.connection();
        let exercises = SqliteRecordRepository::<Exercise>::new(conn)
            .list_all()
            .unwrap();
        let templates = SqliteRecordRepository::<WorkoutTemplate>::new(conn)
            .list_all()
            .unwrap();

        assert_eq!(templates.len(), 3);
        let full_body = templates.iter().find(|t| t.name == "Full Body").unwrap();
        assert_eq!(full_body.exercises.len(), 4);
        assert!(full_body
            .exercises
            .iter()
            .all(|uuid| exercises.iter().any(|e| &e.uuid == uuid)));
    }

    #[test]
    fn test_independently_seeded_stores_merge_without_duplicates() {
        let mut local = Database::open_in_memory().unwrap();
        let mut remote = Database::open_in_memory().unwrap();
        seed_defaults(local.connection_mut()).unwrap();
        seed_defaults(remote.connection_mut()).unwrap();

        let snapshot = create_snapshot(remote.connection(), "remote", 1).unwrap();
        let report = MergeEngine::default()
            .merge(local.connection_mut(), &snapshot)
            .unwrap();

        assert_eq!(report.table(Table::Exercises).inserted, 0);
        assert_eq!(report.table(Table::WorkoutTemplates).inserted, 0);
        assert_eq!(report.conflicts(), 0);
        let conn = local.connection();
        assert_eq!(
            SqliteRecordRepository::<Exercise>::new(conn).count().unwrap(),
            DEFAULT_EXERCISES.len()
        );
        assert_eq!(
            SqliteRecordRepository::<WorkoutTemplate>::new(conn)
                .count()
                .unwrap(),
            DEFAULT_TEMPLATES.len()
        );
    }
}
