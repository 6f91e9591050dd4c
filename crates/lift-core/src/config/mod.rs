//! Sync configuration.
//!
//! A single JSON file selects the provider and tunes the merge. Every field
//! has a default, so a missing file or a partial one is valid. Secrets may
//! also come from the environment instead of the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sync::{SettingsMergePolicy, DEFAULT_FILE_PREFIX};
use crate::util::{is_http_url, normalize_text_option};

pub const CLOUD_URL_ENV: &str = "LIFT_CLOUD_URL";
pub const CLOUD_TOKEN_ENV: &str = "LIFT_CLOUD_TOKEN";
pub const EXPORT_DIR_ENV: &str = "LIFT_EXPORT_DIR";

const DEFAULT_APP_SCOPE: &str = "lift";
const DEFAULT_RETENTION_DAYS: u32 = 30;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Which transport `sync` talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    File,
    Cloud,
}

/// Cloud folder connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudConfig {
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Private folder under `base_url` reserved for this app
    pub app_scope: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            access_token: None,
            app_scope: DEFAULT_APP_SCOPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub provider: ProviderKind,
    /// Where file exports are written
    pub export_dir: Option<PathBuf>,
    pub file_prefix: String,
    pub cloud: CloudConfig,
    pub settings_merge: SettingsMergePolicy,
    /// Tombstones older than this are purged after a successful push; `None` keeps them
    pub tombstone_retention_days: Option<u32>,
    pub http_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::File,
            export_dir: None,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            cloud: CloudConfig::default(),
            settings_merge: SettingsMergePolicy::LastWriteWins,
            tombstone_retention_days: Some(DEFAULT_RETENTION_DAYS),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl SyncConfig {
    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {error}",
                    path.display()
                )));
            }
        };

        let config: Self = serde_json::from_str(&raw)
            .map_err(|error| Error::Config(format!("invalid {}: {error}", path.display())))?;
        config.normalized()
    }

    /// Validate and write the configuration; returns what was written
    pub fn save_to_path(self, path: &Path) -> Result<Self> {
        let config = self.normalized()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, raw)?;
        Ok(config)
    }

    /// Apply `LIFT_*` overrides through `lookup`, which is `std::env::var` outside tests
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = normalize_text_option(lookup(CLOUD_URL_ENV)) {
            self.cloud.base_url = Some(url);
        }
        if let Some(token) = normalize_text_option(lookup(CLOUD_TOKEN_ENV)) {
            self.cloud.access_token = Some(token);
        }
        if let Some(dir) = normalize_text_option(lookup(EXPORT_DIR_ENV)) {
            self.export_dir = Some(PathBuf::from(dir));
        }
        self.normalized()
    }

    /// Retention window in milliseconds, if tombstones are reaped at all
    pub fn retention_ms(&self) -> Option<i64> {
        self.tombstone_retention_days
            .map(|days| i64::from(days) * DAY_MS)
    }

    fn normalized(mut self) -> Result<Self> {
        self.cloud.access_token = normalize_text_option(self.cloud.access_token.take());
        self.cloud.base_url = match normalize_text_option(self.cloud.base_url.take()) {
            Some(url) if is_http_url(&url) => Some(url.trim_end_matches('/').to_string()),
            Some(_) => {
                return Err(Error::Config(
                    "cloud.base_url must include http:// or https://".to_string(),
                ));
            }
            None => None,
        };
        if self.http_timeout_secs == 0 {
            return Err(Error::Config(
                "http_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
