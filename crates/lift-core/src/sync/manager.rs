//! Sync cycle orchestration
//!
//! One cycle: make sure the provider has a session, pull, merge whatever
//! came back, then push the merged local state. Errors abort the cycle and
//! are returned as-is; nothing is retried here.

use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::services::DatabaseService;
use crate::util::now_ms;

use super::merge::{MergeEngine, MergeReport};
use super::provider::SyncProvider;
use super::snapshot::Snapshot;

/// What a finished cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub provider: String,
    /// `None` when the provider had nothing to merge
    pub merged: Option<MergeReport>,
    pub pushed_records: usize,
    pub purged_tombstones: usize,
}

pub struct SyncManager<P> {
    db: DatabaseService,
    provider: P,
    engine: MergeEngine,
    tombstone_retention_ms: Option<i64>,
    cycle: Mutex<()>,
}

impl<P: SyncProvider> SyncManager<P> {
    pub fn new(db: DatabaseService, provider: P, engine: MergeEngine) -> Self {
        Self {
            db,
            provider,
            engine,
            tombstone_retention_ms: None,
            cycle: Mutex::new(()),
        }
    }

    /// Purge tombstones older than `retention_ms` after each successful push
    #[must_use]
    pub const fn with_tombstone_retention(mut self, retention_ms: Option<i64>) -> Self {
        self.tombstone_retention_ms = retention_ms;
        self
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn database(&self) -> &DatabaseService {
        &self.db
    }

    /// Run a full pull, merge, push cycle
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let _cycle = self.begin()?;
        tracing::info!("Starting sync via {}", self.provider.name());

        let result = self.run_sync().await;
        self.record_outcome(&result).await;
        result
    }

    /// Merge a snapshot the user supplied, without pushing anything
    pub async fn import(&self, snapshot: &Snapshot) -> Result<MergeReport> {
        let _cycle = self.begin()?;
        tracing::info!(
            "Importing snapshot from device {} ({} records)",
            snapshot.device_id,
            snapshot.record_count()
        );

        let result = self.merge_snapshot(snapshot).await;
        self.record_outcome(&result).await;
        result
    }

    /// Push the local state without pulling first
    pub async fn export(&self) -> Result<SyncOutcome> {
        let _cycle = self.begin()?;
        tracing::info!("Exporting via {}", self.provider.name());

        let result = async {
            self.ensure_connected().await?;
            let (pushed_records, purged_tombstones) = self.push_local().await?;
            Ok(SyncOutcome {
                provider: self.provider.name().to_string(),
                merged: None,
                pushed_records,
                purged_tombstones,
            })
        }
        .await;
        self.record_outcome(&result).await;
        result
    }

    pub async fn create_snapshot(&self) -> Result<Snapshot> {
        self.db.create_snapshot().await
    }

    /// Merge `remote` into the store after checking its schema version
    pub async fn merge_snapshot(&self, remote: &Snapshot) -> Result<MergeReport> {
        remote.ensure_compatible()?;
        self.db.merge_snapshot(remote, &self.engine).await
    }

    fn begin(&self) -> Result<MutexGuard<'_, ()>> {
        self.cycle.try_lock().map_err(|_| {
            tracing::warn!("Rejected overlapping sync cycle");
            Error::SyncInProgress
        })
    }

    async fn ensure_connected(&self) -> Result<()> {
        if !self.provider.is_authenticated() {
            self.provider.connect().await?;
        }
        Ok(())
    }

    async fn run_sync(&self) -> Result<SyncOutcome> {
        self.ensure_connected().await?;

        let merged = match self.provider.pull().await? {
            Some(remote) => Some(self.merge_snapshot(&remote).await?),
            None => {
                tracing::info!(
                    "Nothing to merge from {}; publishing local state",
                    self.provider.name()
                );
                None
            }
        };

        let (pushed_records, purged_tombstones) = self.push_local().await?;
        Ok(SyncOutcome {
            provider: self.provider.name().to_string(),
            merged,
            pushed_records,
            purged_tombstones,
        })
    }

    async fn push_local(&self) -> Result<(usize, usize)> {
        let snapshot = self.db.create_snapshot().await?;
        self.provider.push(&snapshot).await?;

        let purged = match self.tombstone_retention_ms {
            Some(retention_ms) => {
                self.db
                    .purge_tombstones(now_ms().saturating_sub(retention_ms))
                    .await?
            }
            None => 0,
        };
        Ok((snapshot.record_count(), purged))
    }

    async fn record_outcome<T>(&self, result: &Result<T>) {
        let status = match result {
            Ok(_) => {
                tracing::info!("Sync via {} succeeded", self.provider.name());
                "succeeded".to_string()
            }
            Err(error) => {
                tracing::warn!("Sync via {} failed: {error}", self.provider.name());
                format!("failed: {error}")
            }
        };

        if let Err(error) = self.db.record_sync(now_ms(), &status).await {
            tracing::warn!("Failed to record sync status: {error}");
        }
    }
}
