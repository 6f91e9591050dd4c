use std::path::Path;

use lift_core::models::{Exercise, MuscleGroup};

use crate::commands::common::{
    exercise_to_list_item, format_exercise_lines, normalize_exercise_identifier,
    normalize_exercise_name, open_database, resolve_exercise, ExerciseListItem,
};
use crate::error::CliError;

pub async fn run_exercise_add(
    name_parts: &[String],
    muscle_group: MuscleGroup,
    db_path: &Path,
) -> Result<Exercise, CliError> {
    let name = normalize_exercise_name(name_parts)?;
    let db = open_database(db_path).await?;
    let exercise = db.insert(&Exercise::new(name, muscle_group)).await?;

    println!("{}", exercise.uuid);
    Ok(exercise)
}

pub async fn run_exercise_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let mut exercises = db.list::<Exercise>().await?;
    exercises.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    if as_json {
        let json_items = exercises
            .iter()
            .map(exercise_to_list_item)
            .collect::<Vec<ExerciseListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_exercise_lines(&exercises) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_exercise_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_exercise_identifier(id)?;
    let db = open_database(db_path).await?;
    let exercise = resolve_exercise(&normalized_id, &db).await?;

    db.soft_delete::<Exercise>(&exercise.uuid).await?;
    println!("{}", exercise.uuid);
    Ok(())
}
