use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] lift_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Exercise name cannot be empty")]
    EmptyExerciseName,
    #[error("Exercise ID cannot be empty")]
    EmptyExerciseId,
    #[error("Exercise not found for id/prefix: {0}")]
    ExerciseNotFound(String),
    #[error("{0}")]
    AmbiguousExerciseId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "No export directory configured. Pass --dir, set LIFT_EXPORT_DIR, or add export_dir to the config file."
    )]
    ExportDirNotConfigured,
}
