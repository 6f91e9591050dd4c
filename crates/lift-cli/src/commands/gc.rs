use std::path::Path;

use lift_core::util::now_ms;

use crate::commands::common::{load_config, open_database};
use crate::error::CliError;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Returns the number of purged tombstones
pub async fn run_gc(
    older_than_days: Option<u32>,
    db_path: &Path,
    config_path: &Path,
) -> Result<usize, CliError> {
    let retention_ms = match older_than_days {
        Some(days) => Some(i64::from(days) * DAY_MS),
        None => load_config(config_path)?.retention_ms(),
    };
    let Some(retention_ms) = retention_ms else {
        println!("Tombstone retention is disabled; nothing purged");
        return Ok(0);
    };

    let db = open_database(db_path).await?;
    let purged = db
        .purge_tombstones(now_ms().saturating_sub(retention_ms))
        .await?;
    println!("Purged {purged} tombstones");
    Ok(purged)
}
