use std::path::{Path, PathBuf};

use lift_core::config::{ProviderKind, SyncConfig};

use crate::cli::ConfigCommands;
use crate::commands::common::load_config;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            provider,
            export_dir,
            cloud_url,
        } => {
            let config =
                run_config_init(provider.map(Into::into), export_dir, cloud_url, config_path)?;
            println!("Wrote {}", config_path.display());
            println!("Provider: {}", provider_label(config.provider));
            Ok(())
        }
        ConfigCommands::Show => {
            let config = redact_token(load_config(config_path)?);
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Update the config file in place; returns what was written
pub fn run_config_init(
    provider: Option<ProviderKind>,
    export_dir: Option<PathBuf>,
    cloud_url: Option<String>,
    config_path: &Path,
) -> Result<SyncConfig, CliError> {
    // The file alone, so environment overrides are never persisted
    let mut config = SyncConfig::load_from_path(config_path)?;
    if let Some(provider) = provider {
        config.provider = provider;
    }
    if let Some(export_dir) = export_dir {
        config.export_dir = Some(export_dir);
    }
    if let Some(cloud_url) = cloud_url {
        config.cloud.base_url = Some(cloud_url);
    }

    Ok(config.save_to_path(config_path)?)
}

pub fn redact_token(mut config: SyncConfig) -> SyncConfig {
    if config.cloud.access_token.is_some() {
        config.cloud.access_token = Some("[REDACTED]".to_string());
    }
    config
}

const fn provider_label(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::File => "file",
        ProviderKind::Cloud => "cloud",
    }
}
