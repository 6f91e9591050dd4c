//! Offline-first snapshot sync
//!
//! The local store is the source of truth. Sync exchanges whole-store
//! snapshots through a provider and merges them record by record.

mod manager;
mod merge;
mod provider;
mod providers;
mod snapshot;

pub use manager::{SyncManager, SyncOutcome};
pub use merge::{MergeEngine, MergeReport, SettingsMergePolicy, TableReport};
pub use provider::{Provider, SyncProvider};
pub use providers::{CloudFolderProvider, FileProvider, DEFAULT_FILE_PREFIX, SNAPSHOT_OBJECT_NAME};
pub use snapshot::{
    create_snapshot, encode_snapshot, parse_snapshot, Snapshot, SnapshotData, SCHEMA_VERSION,
};
