use std::env;
use std::path::{Path, PathBuf};

use lift_core::config::SyncConfig;
use lift_core::models::{ConflictRecord, Exercise};
use lift_core::services::DatabaseService;
use lift_core::sync::{MergeEngine, MergeReport, Provider, SyncManager};
use serde::Serialize;

use crate::error::CliError;

const DB_PATH_ENV: &str = "LIFT_DB_PATH";
const CONFIG_PATH_ENV: &str = "LIFT_CONFIG";

#[derive(Debug, Serialize)]
pub struct ConflictItem {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub local_updated_at: i64,
    pub remote_updated_at: i64,
    pub resolution: Option<String>,
    pub recorded_at: i64,
    pub recorded_at_iso: String,
}

#[derive(Debug, Serialize)]
pub struct ExerciseListItem {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub is_custom: bool,
    pub updated_at: i64,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("lift").join("lift.db"))
        .ok_or_else(|| {
            CliError::Config("could not resolve a data directory; pass --db-path".to_string())
        })
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) =
        cli_config_path.or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    {
        return Ok(path);
    }
    default_config_path()
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("lift").join("config.json"))
        .ok_or_else(|| {
            CliError::Config("could not resolve a config directory; pass --config".to_string())
        })
}

/// Config file plus `LIFT_*` environment overrides
pub fn load_config(path: &Path) -> Result<SyncConfig, CliError> {
    let config = SyncConfig::load_from_path(path)?;
    Ok(config.apply_env_overrides(|key| env::var(key).ok())?)
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path.to_path_buf()).await?)
}

pub fn build_manager(
    db: DatabaseService,
    provider: Provider,
    config: &SyncConfig,
) -> SyncManager<Provider> {
    SyncManager::new(db, provider, MergeEngine::new(config.settings_merge))
        .with_tombstone_retention(config.retention_ms())
}

pub async fn resolve_exercise(query: &str, db: &DatabaseService) -> Result<Exercise, CliError> {
    if let Some(exercise) = db.get::<Exercise>(query).await? {
        if exercise.deleted_at.is_none() {
            return Ok(exercise);
        }
    }

    let mut matching = db
        .list::<Exercise>()
        .await?
        .into_iter()
        .filter(|exercise| exercise.uuid.starts_with(query))
        .collect::<Vec<_>>();

    match matching.len() {
        0 => Err(CliError::ExerciseNotFound(query.to_string())),
        1 => Ok(matching.remove(0)),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|exercise| exercise.uuid.chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousExerciseId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_exercise_name(parts: &[String]) -> Result<String, CliError> {
    let name = parts.join(" ");
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        Err(CliError::EmptyExerciseName)
    } else {
        Ok(name)
    }
}

pub fn normalize_exercise_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyExerciseId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn exercise_to_list_item(exercise: &Exercise) -> ExerciseListItem {
    ExerciseListItem {
        id: exercise.uuid.clone(),
        name: exercise.name.clone(),
        muscle_group: enum_label(&exercise.muscle_group),
        is_custom: exercise.is_custom,
        updated_at: exercise.updated_at,
    }
}

pub fn format_exercise_lines(exercises: &[Exercise]) -> Vec<String> {
    exercises
        .iter()
        .map(|exercise| {
            let short_id = exercise.uuid.chars().take(13).collect::<String>();
            let muscle_group = enum_label(&exercise.muscle_group);
            let marker = if exercise.is_custom { "custom" } else { "" };
            format!("{short_id:<13}  {:<32}  {muscle_group:<10}  {marker}", exercise.name)
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn conflict_to_item(conflict: &ConflictRecord) -> ConflictItem {
    ConflictItem {
        id: conflict.uuid.clone(),
        entity_type: enum_label(&conflict.entity_type),
        entity_id: conflict.entity_id.clone(),
        local_updated_at: conflict.local_updated_at,
        remote_updated_at: conflict.remote_updated_at,
        resolution: conflict.resolution.as_ref().map(enum_label),
        recorded_at: conflict.updated_at,
        recorded_at_iso: format_sync_timestamp(conflict.updated_at),
    }
}

pub fn format_conflict_lines(conflicts: &[ConflictRecord]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let resolution = conflict
                .resolution
                .as_ref()
                .map_or_else(|| "open".to_string(), enum_label);
            format!(
                "{}  {:<6}  {}={}  local={} remote={}",
                format_sync_timestamp(conflict.updated_at),
                resolution,
                enum_label(&conflict.entity_type),
                conflict.entity_id,
                conflict.local_updated_at,
                conflict.remote_updated_at
            )
        })
        .collect()
}

/// One line per table that the merge touched
pub fn format_merge_lines(report: &MergeReport) -> Vec<String> {
    report
        .tables()
        .filter(|(_, counts)| counts.changed() + counts.conflicts + counts.skipped > 0)
        .map(|(table, counts)| {
            let mut line = format!(
                "  {table}: {} new, {} updated",
                counts.inserted, counts.updated
            );
            if counts.conflicts > 0 {
                line.push_str(&format!(", {} conflicts", counts.conflicts));
            }
            if counts.skipped > 0 {
                line.push_str(&format!(", {} skipped", counts.skipped));
            }
            line
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Serialized name of a snake_case/lowercase serde enum
fn enum_label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}
