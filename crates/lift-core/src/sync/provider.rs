//! Sync provider contract
//!
//! A provider moves whole snapshots between this device and somewhere else.
//! It knows nothing about records or merging.

use std::time::Duration;

use crate::config::{ProviderKind, SyncConfig};
use crate::error::{Error, Result};

use super::providers::{CloudFolderProvider, FileProvider};
use super::snapshot::Snapshot;

/// Transport for snapshots
#[allow(async_fn_in_trait)]
pub trait SyncProvider {
    /// Short name for status lines and logs
    fn name(&self) -> &str;

    /// Establish a session; calling it again while connected is a no-op
    async fn connect(&self) -> Result<()>;

    /// Tear down the session
    async fn disconnect(&self) -> Result<()>;

    /// Whether a session is currently established
    fn is_authenticated(&self) -> bool;

    /// Fetch the remote snapshot; `None` means there is nothing to merge yet
    async fn pull(&self) -> Result<Option<Snapshot>>;

    /// Upload a snapshot, replacing whatever the remote held
    async fn push(&self, snapshot: &Snapshot) -> Result<()>;
}

/// The providers this build ships with
#[derive(Debug)]
pub enum Provider {
    File(FileProvider),
    CloudFolder(CloudFolderProvider),
}

impl Provider {
    /// Build the provider selected in `config`
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        match config.provider {
            ProviderKind::File => {
                let export_dir = config.export_dir.clone().ok_or_else(|| {
                    Error::Config("export_dir is required for the file provider".to_string())
                })?;
                Ok(Self::File(
                    FileProvider::new(export_dir).with_prefix(&config.file_prefix),
                ))
            }
            ProviderKind::Cloud => {
                let base_url = config.cloud.base_url.clone().ok_or_else(|| {
                    Error::Config("cloud.base_url is required for the cloud provider".to_string())
                })?;
                Ok(Self::CloudFolder(CloudFolderProvider::new(
                    base_url,
                    &config.cloud.app_scope,
                    config.cloud.access_token.clone(),
                    Duration::from_secs(config.http_timeout_secs),
                )?))
            }
        }
    }
}

impl From<FileProvider> for Provider {
    fn from(provider: FileProvider) -> Self {
        Self::File(provider)
    }
}

impl From<CloudFolderProvider> for Provider {
    fn from(provider: CloudFolderProvider) -> Self {
        Self::CloudFolder(provider)
    }
}

impl SyncProvider for Provider {
    fn name(&self) -> &str {
        match self {
            Self::File(provider) => provider.name(),
            Self::CloudFolder(provider) => provider.name(),
        }
    }

    async fn connect(&self) -> Result<()> {
        match self {
            Self::File(provider) => provider.connect().await,
            Self::CloudFolder(provider) => provider.connect().await,
        }
    }

    async fn disconnect(&self) -> Result<()> {
        match self {
            Self::File(provider) => provider.disconnect().await,
            Self::CloudFolder(provider) => provider.disconnect().await,
        }
    }

    fn is_authenticated(&self) -> bool {
        match self {
            Self::File(provider) => provider.is_authenticated(),
            Self::CloudFolder(provider) => provider.is_authenticated(),
        }
    }

    async fn pull(&self) -> Result<Option<Snapshot>> {
        match self {
            Self::File(provider) => provider.pull().await,
            Self::CloudFolder(provider) => provider.pull().await,
        }
    }

    async fn push(&self, snapshot: &Snapshot) -> Result<()> {
        match self {
            Self::File(provider) => provider.push(snapshot).await,
            Self::CloudFolder(provider) => provider.push(snapshot).await,
        }
    }
}
