use std::path::Path;

use lift_core::config::{ProviderKind, SyncConfig};
use lift_core::sync::{FileProvider, Provider, SyncOutcome};

use crate::commands::common::{build_manager, format_merge_lines, load_config, open_database};
use crate::error::CliError;

pub async fn run_sync(
    provider: Option<ProviderKind>,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    if let Some(provider) = provider {
        config.provider = provider;
    }
    if config.provider == ProviderKind::File && config.export_dir.is_none() {
        return Err(CliError::ExportDirNotConfigured);
    }

    let db = open_database(db_path).await?;
    let manager = build_manager(db, Provider::from_config(&config)?, &config);
    let outcome = manager.sync().await?;

    for line in format_outcome_lines(&outcome) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_export(
    dir: Option<&Path>,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let provider = file_provider(dir, &config)?;
    let export_dir = provider.export_dir().to_path_buf();

    let db = open_database(db_path).await?;
    let manager = build_manager(db, provider.into(), &config);
    let outcome = manager.export().await?;

    println!(
        "Exported {} records to {}",
        outcome.pushed_records,
        export_dir.display()
    );
    Ok(())
}

pub async fn run_import(file: &Path, db_path: &Path, config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    // Parse before touching the store so a bad file changes nothing
    let snapshot = FileProvider::import_file(file).await?;

    let export_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let provider = FileProvider::new(export_dir).with_prefix(&config.file_prefix);
    let db = open_database(db_path).await?;
    let manager = build_manager(db, provider.into(), &config);
    let report = manager.import(&snapshot).await?;

    println!(
        "Imported snapshot from device {}: {} rows written, {} conflicts",
        snapshot.device_id,
        report.changed(),
        report.conflicts()
    );
    for line in format_merge_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn file_provider(dir: Option<&Path>, config: &SyncConfig) -> Result<FileProvider, CliError> {
    let export_dir = dir
        .map(Path::to_path_buf)
        .or_else(|| config.export_dir.clone())
        .ok_or(CliError::ExportDirNotConfigured)?;
    Ok(FileProvider::new(export_dir).with_prefix(&config.file_prefix))
}

pub fn format_outcome_lines(outcome: &SyncOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match &outcome.merged {
        Some(report) => {
            lines.push(format!(
                "Merged remote snapshot via {}: {} rows written, {} conflicts",
                outcome.provider,
                report.changed(),
                report.conflicts()
            ));
            lines.extend(format_merge_lines(report));
        }
        None => lines.push(format!(
            "No remote snapshot via {}; published local state",
            outcome.provider
        )),
    }
    lines.push(format!("Pushed {} records", outcome.pushed_records));
    if outcome.purged_tombstones > 0 {
        lines.push(format!(
            "Purged {} old tombstones",
            outcome.purged_tombstones
        ));
    }
    lines
}
