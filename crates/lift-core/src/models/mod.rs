//! Data models for Lift

mod conflict;
mod exercise;
mod record;
mod set_entry;
mod settings;
mod template;
mod workout;

pub use conflict::{ConflictRecord, EntityType, Resolution};
pub use exercise::{Exercise, MovementType, MuscleGroup};
pub use record::{new_record_uuid, SyncRecord, Table};
pub use set_entry::{SetEntry, Side};
pub use settings::{MassUnit, RpeType, Settings, ThemeMode};
pub use template::WorkoutTemplate;
pub use workout::{Mood, Workout, WorkoutExercise};
