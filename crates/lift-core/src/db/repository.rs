//! Record repository implementation
//!
//! Every syncable table shares one document-style layout, so a single
//! generic repository serves all of them.

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::models::SyncRecord;
use crate::util::next_timestamp;
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for record storage operations
pub trait RecordRepository<T: SyncRecord> {
    /// Insert a record as-is (timestamps kept), assigning a fresh local id
    fn insert(&self, record: &T) -> Result<T>;

    /// Get a record by uuid, tombstoned rows included
    fn get_by_uuid(&self, uuid: &str) -> Result<Option<T>>;

    /// First row by local id; used for singleton tables
    fn first(&self) -> Result<Option<T>>;

    /// Every row, tombstones included, in local id order
    fn list_all(&self) -> Result<Vec<T>>;

    /// Rows without a tombstone, in local id order
    fn list_live(&self) -> Result<Vec<T>>;

    /// Apply a local edit; refreshes `updated_at`
    fn update(&self, record: &T) -> Result<T>;

    /// Overwrite the row with the given local id with `record`'s fields verbatim
    fn replace(&self, local_id: i64, record: &T) -> Result<T>;

    /// Tombstone a record; the row stays so the deletion can sync
    fn soft_delete(&self, uuid: &str) -> Result<T>;

    /// Physically remove tombstones with `deleted_at` before `before_ms`
    fn purge_tombstones(&self, before_ms: i64) -> Result<usize>;

    /// Number of rows, tombstones included
    fn count(&self) -> Result<usize>;
}

/// `SQLite` implementation of `RecordRepository`
pub struct SqliteRecordRepository<'a, T> {
    conn: &'a Connection,
    _record: PhantomData<T>,
}

impl<'a, T: SyncRecord> SqliteRecordRepository<'a, T> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    fn table() -> &'static str {
        T::TABLE.sql_name()
    }

    /// JSON body stored in `data`; the local id lives only in its column
    fn encode(record: &T) -> Result<String> {
        let mut body = record.clone();
        body.set_local_id(None);
        Ok(serde_json::to_string(&body)?)
    }

    fn decode(id: i64, data: &str) -> Result<T> {
        let mut record: T = serde_json::from_str(data)?;
        record.set_local_id(Some(id));
        Ok(record)
    }

    fn query_records(&self, sql: &str) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, data)| Self::decode(id, &data))
            .collect()
    }

    fn validate(record: &T) -> Result<()> {
        if record.uuid().trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "{} record without uuid",
                T::TABLE
            )));
        }
        Ok(())
    }
}

impl<T: SyncRecord> RecordRepository<T> for SqliteRecordRepository<'_, T> {
    fn insert(&self, record: &T) -> Result<T> {
        Self::validate(record)?;
        let data = Self::encode(record)?;

        self.conn.execute(
            &format!(
                "INSERT INTO {} (uuid, updated_at, deleted_at, data) VALUES (?, ?, ?, ?)",
                Self::table()
            ),
            params![
                record.uuid(),
                record.updated_at(),
                record.deleted_at(),
                data
            ],
        )?;

        let mut inserted = record.clone();
        inserted.set_local_id(Some(self.conn.last_insert_rowid()));
        Ok(inserted)
    }

    fn get_by_uuid(&self, uuid: &str) -> Result<Option<T>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT id, data FROM {} WHERE uuid = ?", Self::table()),
                params![uuid],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, data)| Self::decode(id, &data)).transpose()
    }

    fn first(&self) -> Result<Option<T>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT id, data FROM {} ORDER BY id ASC LIMIT 1", Self::table()),
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, data)| Self::decode(id, &data)).transpose()
    }

    fn list_all(&self) -> Result<Vec<T>> {
        self.query_records(&format!(
            "SELECT id, data FROM {} ORDER BY id ASC",
            Self::table()
        ))
    }

    fn list_live(&self) -> Result<Vec<T>> {
        self.query_records(&format!(
            "SELECT id, data FROM {} WHERE deleted_at IS NULL ORDER BY id ASC",
            Self::table()
        ))
    }

    fn update(&self, record: &T) -> Result<T> {
        let stored = self
            .get_by_uuid(record.uuid())?
            .ok_or_else(|| Error::NotFound(record.uuid().to_string()))?;
        let local_id = stored
            .local_id()
            .ok_or_else(|| Error::NotFound(record.uuid().to_string()))?;

        let mut edited = record.clone();
        edited.set_updated_at(next_timestamp(stored.updated_at().max(record.updated_at())));
        self.replace(local_id, &edited)
    }

    fn replace(&self, local_id: i64, record: &T) -> Result<T> {
        Self::validate(record)?;
        let data = Self::encode(record)?;

        let rows = self.conn.execute(
            &format!(
                "UPDATE {} SET uuid = ?, updated_at = ?, deleted_at = ?, data = ? WHERE id = ?",
                Self::table()
            ),
            params![
                record.uuid(),
                record.updated_at(),
                record.deleted_at(),
                data,
                local_id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(format!("{} row {local_id}", T::TABLE)));
        }

        let mut replaced = record.clone();
        replaced.set_local_id(Some(local_id));
        Ok(replaced)
    }

    fn soft_delete(&self, uuid: &str) -> Result<T> {
        let mut record = self
            .get_by_uuid(uuid)?
            .filter(|record| !record.is_deleted())
            .ok_or_else(|| Error::NotFound(uuid.to_string()))?;
        let local_id = record
            .local_id()
            .ok_or_else(|| Error::NotFound(uuid.to_string()))?;

        let now = next_timestamp(record.updated_at());
        record.set_updated_at(now);
        record.set_deleted_at(Some(now));
        self.replace(local_id, &record)
    }

    fn purge_tombstones(&self, before_ms: i64) -> Result<usize> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE deleted_at IS NOT NULL AND deleted_at < ?",
                Self::table()
            ),
            params![before_ms],
        )?;
        Ok(removed)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", Self::table()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Exercise, MuscleGroup, SetEntry};
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup();
        let repo = SqliteRecordRepository::<Exercise>::new(db.connection());

        let exercise = Exercise::new("Hack Squat", MuscleGroup::Legs);
        let inserted = repo.insert(&exercise).unwrap();
        assert!(inserted.id.is_some());

        let fetched = repo.get_by_uuid(&exercise.uuid).unwrap().unwrap();
        assert_eq!(fetched, inserted);
    }

    #[test]
    fn test_insert_ignores_supplied_id() {
        let db = setup();
        let repo = SqliteRecordRepository::<Exercise>::new(db.connection());

        let mut exercise = Exercise::new("Row", MuscleGroup::Back);
        exercise.id = Some(999);
        let inserted = repo.insert(&exercise).unwrap();
        assert_eq!(inserted.id, Some(1));
    }

    #[test]
    fn test_insert_rejects_empty_uuid() {
        let db = setup();
        let repo = SqliteRecordRepository::<Exercise>::new(db.connection());

        let mut exercise = Exercise::new("Row", MuscleGroup::Back);
        exercise.uuid = "  ".to_string();
        assert!(matches!(repo.insert(&exercise), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_update_refreshes_timestamp_and_keeps_id() {
        let db = setup();
        let repo = SqliteRecordRepository::<SetEntry>::new(db.connection());

        let set = repo.insert(&SetEntry::new("we-1", 0, 50.0, 5)).unwrap();
        let mut edited = set.clone();
        edited.weight = 55.0;
        let updated = repo.update(&edited).unwrap();

        assert_eq!(updated.id, set.id);
        assert!(updated.updated_at > set.updated_at);
        let fetched = repo.get_by_uuid(&set.uuid).unwrap().unwrap();
        assert!((fetched.weight - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_soft_delete_keeps_row() {
        let db = setup();
        let repo = SqliteRecordRepository::<Exercise>::new(db.connection());

        let exercise = repo
            .insert(&Exercise::new("Dips", MuscleGroup::Chest))
            .unwrap();
        let deleted = repo.soft_delete(&exercise.uuid).unwrap();

        assert_eq!(deleted.deleted_at, Some(deleted.updated_at));
        assert!(repo.list_live().unwrap().is_empty());
        assert_eq!(repo.list_all().unwrap().len(), 1);

        // A second delete finds nothing live
        assert!(matches!(
            repo.soft_delete(&exercise.uuid),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_purge_tombstones_respects_cutoff() {
        let db = setup();
        let repo = SqliteRecordRepository::<Exercise>::new(db.connection());

        let mut old = Exercise::new("Old", MuscleGroup::Other);
        old.deleted_at = Some(1_000);
        let mut recent = Exercise::new("Recent", MuscleGroup::Other);
        recent.deleted_at = Some(5_000);
        let live = Exercise::new("Live", MuscleGroup::Other);

        repo.insert(&old).unwrap();
        repo.insert(&recent).unwrap();
        repo.insert(&live).unwrap();

        assert_eq!(repo.purge_tombstones(2_000).unwrap(), 1);
        assert_eq!(repo.count().unwrap(), 2);
        assert!(repo.get_by_uuid(&old.uuid).unwrap().is_none());
    }

    #[test]
    fn test_first_returns_lowest_id() {
        let db = setup();
        let repo = SqliteRecordRepository::<Exercise>::new(db.connection());

        let a = repo.insert(&Exercise::new("A", MuscleGroup::Arms)).unwrap();
        repo.insert(&Exercise::new("B", MuscleGroup::Arms)).unwrap();

        assert_eq!(repo.first().unwrap().unwrap().uuid, a.uuid);
    }
}
