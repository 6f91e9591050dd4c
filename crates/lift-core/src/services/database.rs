//! Shared database service wrapper used by the sync manager and the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::{
    seed_defaults, Database, LastSync, MetaRepository, RecordRepository, SqliteMetaRepository,
    SqliteRecordRepository,
};
use crate::models::{
    ConflictRecord, Exercise, SetEntry, Settings, SyncRecord, Table, Workout, WorkoutExercise,
    WorkoutTemplate,
};
use crate::sync::{create_snapshot, MergeEngine, MergeReport, Snapshot};
use crate::util::now_ms;
use crate::Result;

/// Row counts of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCount {
    pub table: Table,
    pub total: usize,
    pub live: usize,
}

/// Thread-safe service for DB and repository operations.
///
/// The connection sits behind one async mutex, so a merge holding it is
/// never observed half-applied.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db = Database::open(&db_path)?;
        tracing::debug!("Opened database at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub async fn insert<T: SyncRecord>(&self, record: &T) -> Result<T> {
        let db = self.db.lock().await;
        SqliteRecordRepository::<T>::new(db.connection()).insert(record)
    }

    pub async fn update<T: SyncRecord>(&self, record: &T) -> Result<T> {
        let db = self.db.lock().await;
        SqliteRecordRepository::<T>::new(db.connection()).update(record)
    }

    pub async fn get<T: SyncRecord>(&self, uuid: &str) -> Result<Option<T>> {
        let db = self.db.lock().await;
        SqliteRecordRepository::<T>::new(db.connection()).get_by_uuid(uuid)
    }

    pub async fn soft_delete<T: SyncRecord>(&self, uuid: &str) -> Result<T> {
        let db = self.db.lock().await;
        let deleted = SqliteRecordRepository::<T>::new(db.connection()).soft_delete(uuid)?;
        tracing::debug!("Tombstoned {} {uuid}", T::TABLE);
        Ok(deleted)
    }

    /// Live rows of a table
    pub async fn list<T: SyncRecord>(&self) -> Result<Vec<T>> {
        let db = self.db.lock().await;
        SqliteRecordRepository::<T>::new(db.connection()).list_live()
    }

    /// Every row of a table, tombstones included
    pub async fn list_all<T: SyncRecord>(&self) -> Result<Vec<T>> {
        let db = self.db.lock().await;
        SqliteRecordRepository::<T>::new(db.connection()).list_all()
    }

    /// Most recent conflict log entries first
    pub async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>> {
        let mut conflicts = self.list::<ConflictRecord>().await?;
        conflicts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conflicts.truncate(limit);
        Ok(conflicts)
    }

    /// Row counts for every syncable table, in merge order
    pub async fn table_counts(&self) -> Result<Vec<TableCount>> {
        let db = self.db.lock().await;
        let conn = db.connection();
        Ok(vec![
            count_rows::<Settings>(conn)?,
            count_rows::<Exercise>(conn)?,
            count_rows::<Workout>(conn)?,
            count_rows::<WorkoutExercise>(conn)?,
            count_rows::<SetEntry>(conn)?,
            count_rows::<WorkoutTemplate>(conn)?,
            count_rows::<ConflictRecord>(conn)?,
        ])
    }

    pub async fn device_id(&self) -> Result<String> {
        let db = self.db.lock().await;
        SqliteMetaRepository::new(db.connection()).device_id()
    }

    pub async fn last_sync(&self) -> Result<LastSync> {
        let db = self.db.lock().await;
        SqliteMetaRepository::new(db.connection()).last_sync()
    }

    pub async fn record_sync(&self, at: i64, status: &str) -> Result<()> {
        let db = self.db.lock().await;
        SqliteMetaRepository::new(db.connection()).record_sync(at, status)
    }

    /// Seed default settings, exercises and templates into an empty store
    pub async fn seed_defaults(&self) -> Result<bool> {
        let mut db = self.db.lock().await;
        seed_defaults(db.connection_mut())
    }

    /// Physically remove tombstones older than `before_ms` from every table
    pub async fn purge_tombstones(&self, before_ms: i64) -> Result<usize> {
        let mut db = self.db.lock().await;
        let tx = db.connection_mut().transaction()?;
        let purged = purge::<Settings>(&tx, before_ms)?
            + purge::<Exercise>(&tx, before_ms)?
            + purge::<Workout>(&tx, before_ms)?
            + purge::<WorkoutExercise>(&tx, before_ms)?
            + purge::<SetEntry>(&tx, before_ms)?
            + purge::<WorkoutTemplate>(&tx, before_ms)?
            + purge::<ConflictRecord>(&tx, before_ms)?;
        tx.commit()?;

        if purged > 0 {
            tracing::info!("Purged {purged} tombstones older than {before_ms}");
        }
        Ok(purged)
    }

    /// Snapshot of the whole store, stamped with this device's id
    pub async fn create_snapshot(&self) -> Result<Snapshot> {
        let db = self.db.lock().await;
        let conn = db.connection();
        let device_id = SqliteMetaRepository::new(conn).device_id()?;
        create_snapshot(conn, &device_id, now_ms())
    }

    /// Merge a remote snapshot while holding the store exclusively
    pub async fn merge_snapshot(
        &self,
        snapshot: &Snapshot,
        engine: &MergeEngine,
    ) -> Result<MergeReport> {
        let mut db = self.db.lock().await;
        engine.merge(db.connection_mut(), snapshot)
    }
}

fn count_rows<T: SyncRecord>(conn: &Connection) -> Result<TableCount> {
    let repo = SqliteRecordRepository::<T>::new(conn);
    Ok(TableCount {
        table: T::TABLE,
        total: repo.count()?,
        live: repo.list_live()?.len(),
    })
}

fn purge<T: SyncRecord>(conn: &Connection, before_ms: i64) -> Result<usize> {
    SqliteRecordRepository::<T>::new(conn).purge_tombstones(before_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MuscleGroup;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_path_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("lift.db");

        let service = DatabaseService::open_path(&path).await.unwrap();
        assert_eq!(service.db_path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn insert_list_and_delete_roundtrip() {
        let service = DatabaseService::open_in_memory().unwrap();

        let exercise = service
            .insert(&Exercise::new("Front Squat", MuscleGroup::Legs))
            .await
            .unwrap();
        assert_eq!(service.list::<Exercise>().await.unwrap(), vec![exercise.clone()]);

        service.soft_delete::<Exercise>(&exercise.uuid).await.unwrap();
        assert!(service.list::<Exercise>().await.unwrap().is_empty());
        assert_eq!(service.list_all::<Exercise>().await.unwrap().len(), 1);

        let counts = service.table_counts().await.unwrap();
        let exercises = counts.iter().find(|c| c.table == Table::Exercises).unwrap();
        assert_eq!((exercises.total, exercises.live), (1, 0));
        assert_eq!(counts.len(), Table::ALL.len());
    }

    #[tokio::test]
    async fn purge_tombstones_spans_tables() {
        let service = DatabaseService::open_in_memory().unwrap();

        let mut exercise = Exercise::new("Old", MuscleGroup::Other);
        exercise.deleted_at = Some(10);
        service.insert(&exercise).await.unwrap();
        let mut set = SetEntry::new("we", 0, 20.0, 10);
        set.deleted_at = Some(10);
        service.insert(&set).await.unwrap();
        service.insert(&Workout::start()).await.unwrap();

        assert_eq!(service.purge_tombstones(11).await.unwrap(), 2);
        assert_eq!(service.purge_tombstones(11).await.unwrap(), 0);
        assert_eq!(service.list_all::<Workout>().await.unwrap().len(), 1);
    }

    async fn local_meta_rows(service: &DatabaseService) -> Vec<(String, String)> {
        let db = service.db.lock().await;
        let mut stmt = db
            .connection()
            .prepare("SELECT key, value FROM local_meta ORDER BY key")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    #[tokio::test]
    async fn create_snapshot_leaves_local_meta_untouched() {
        let service = DatabaseService::open_in_memory().unwrap();
        let before = local_meta_rows(&service).await;
        assert_eq!(before.len(), 1);

        service.create_snapshot().await.unwrap();

        assert_eq!(local_meta_rows(&service).await, before);
    }

    #[tokio::test]
    async fn snapshot_carries_device_id() {
        let service = DatabaseService::open_in_memory().unwrap();
        let device_id = service.device_id().await.unwrap();

        let snapshot = service.create_snapshot().await.unwrap();
        assert_eq!(snapshot.device_id, device_id);
    }

    #[tokio::test]
    async fn list_conflicts_newest_first() {
        let service = DatabaseService::open_in_memory().unwrap();
        for (uuid, updated_at) in [("a", 1), ("b", 3), ("c", 2)] {
            let conflict = ConflictRecord {
                id: None,
                uuid: uuid.to_string(),
                entity_type: crate::models::EntityType::Set,
                entity_id: format!("set-{uuid}"),
                local_updated_at: 1,
                remote_updated_at: 1,
                resolved_at: None,
                resolution: None,
                snapshot: None,
                updated_at,
                deleted_at: None,
            };
            service.insert(&conflict).await.unwrap();
        }

        let conflicts = service.list_conflicts(2).await.unwrap();
        let uuids = conflicts.iter().map(|c| c.uuid.as_str()).collect::<Vec<_>>();
        assert_eq!(uuids, vec!["b", "c"]);
    }
}
