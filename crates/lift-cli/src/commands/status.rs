use std::path::Path;

use lift_core::services::TableCount;
use lift_core::util::now_ms;
use serde::Serialize;

use crate::commands::common::{format_relative_time, format_sync_timestamp, open_database};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub db_path: String,
    pub device_id: String,
    pub last_sync_at: Option<i64>,
    pub last_sync_status: Option<String>,
    pub tables: Vec<TableCount>,
}

pub async fn load_status(db_path: &Path) -> Result<StatusReport, CliError> {
    let db = open_database(db_path).await?;
    let last_sync = db.last_sync().await?;

    Ok(StatusReport {
        db_path: db_path.display().to_string(),
        device_id: db.device_id().await?,
        last_sync_at: last_sync.at,
        last_sync_status: last_sync.status,
        tables: db.table_counts().await?,
    })
}

pub async fn run_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let status = load_status(db_path).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    for line in format_status_lines(&status, now_ms()) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_status_lines(status: &StatusReport, now_ms: i64) -> Vec<String> {
    let last_sync = match (status.last_sync_at, status.last_sync_status.as_deref()) {
        (Some(at), Some(result)) => format!(
            "{} ({}) {result}",
            format_sync_timestamp(at),
            format_relative_time(at, now_ms)
        ),
        _ => "never".to_string(),
    };

    let mut lines = vec![
        format!("Database:  {}", status.db_path),
        format!("Device ID: {}", status.device_id),
        format!("Last sync: {last_sync}"),
    ];
    for count in &status.tables {
        let table = count.table.to_string();
        let deleted = count.total - count.live;
        if deleted > 0 {
            lines.push(format!("  {table:<18} {:>6}  ({deleted} deleted)", count.live));
        } else {
            lines.push(format!("  {table:<18} {:>6}", count.live));
        }
    }
    lines
}
