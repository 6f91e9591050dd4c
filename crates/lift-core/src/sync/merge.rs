//! Snapshot merge engine
//!
//! Folds a remote snapshot into the local store record by record, using
//! last-write-wins on `updatedAt`. One pass runs inside one transaction.

use std::cmp::Ordering;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{RecordRepository, SqliteRecordRepository};
use crate::error::{Error, Result};
use crate::models::{
    new_record_uuid, ConflictRecord, EntityType, Resolution, Settings, SyncRecord, Table,
};
use crate::util::now_ms;

use super::snapshot::{Snapshot, SnapshotData};

/// How the settings singleton is reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsMergePolicy {
    /// Newer `updatedAt` wins, like every other table
    #[default]
    LastWriteWins,
    /// Remote settings are only taken when there are no local settings
    KeepLocal,
}

/// Per-table outcome of one merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    pub inserted: usize,
    pub updated: usize,
    pub kept_local: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// Equal timestamps with diverging content
    pub conflicts: usize,
}

impl TableReport {
    /// Rows this pass wrote
    pub const fn changed(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Outcome of one merge pass, table by table in merge order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    tables: Vec<(Table, TableReport)>,
}

impl MergeReport {
    fn push(&mut self, table: Table, counts: TableReport) {
        tracing::debug!(
            "Merged {table}: {} inserted, {} updated, {} kept local, {} unchanged, {} skipped",
            counts.inserted,
            counts.updated,
            counts.kept_local,
            counts.unchanged,
            counts.skipped
        );
        self.tables.push((table, counts));
    }

    /// Counts for one table; zeroes if the table was not part of the pass
    pub fn table(&self, table: Table) -> TableReport {
        self.tables
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, counts)| *counts)
            .unwrap_or_default()
    }

    pub fn tables(&self) -> impl Iterator<Item = (Table, TableReport)> + '_ {
        self.tables.iter().copied()
    }

    /// Rows written across all tables
    pub fn changed(&self) -> usize {
        self.tables.iter().map(|(_, counts)| counts.changed()).sum()
    }

    /// Ties recorded across all tables
    pub fn conflicts(&self) -> usize {
        self.tables.iter().map(|(_, counts)| counts.conflicts).sum()
    }
}

/// Applies remote snapshots to the local store
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    settings_policy: SettingsMergePolicy,
    #[cfg(test)]
    fail_after: Option<Table>,
}

impl MergeEngine {
    pub const fn new(settings_policy: SettingsMergePolicy) -> Self {
        Self {
            settings_policy,
            #[cfg(test)]
            fail_after: None,
        }
    }

    pub const fn settings_policy(&self) -> SettingsMergePolicy {
        self.settings_policy
    }

    /// Raise a fault right after `table` has been written, before commit
    #[cfg(test)]
    pub(crate) const fn failing_after(mut self, table: Table) -> Self {
        self.fail_after = Some(table);
        self
    }

    /// Merge `remote` into the store.
    ///
    /// Either every table is merged or nothing is: any failure rolls the
    /// whole pass back and surfaces as `MergeTransaction`.
    pub fn merge(&self, conn: &mut Connection, remote: &Snapshot) -> Result<MergeReport> {
        remote.ensure_compatible()?;

        let tx = conn.transaction().map_err(into_merge_error)?;
        let report = self
            .merge_tables(&tx, &remote.data, now_ms())
            .map_err(into_merge_error)?;
        tx.commit().map_err(into_merge_error)?;

        tracing::info!(
            "Merged snapshot from {}: {} rows written, {} conflicts",
            remote.device_id,
            report.changed(),
            report.conflicts()
        );
        Ok(report)
    }

    fn merge_tables(&self, conn: &Connection, data: &SnapshotData, now: i64) -> Result<MergeReport> {
        let mut report = MergeReport::default();
        let mut ties = Vec::new();

        report.push(
            Table::Settings,
            self.merge_settings(conn, &data.settings, &mut ties, now)?,
        );
        self.checkpoint(Table::Settings)?;

        report.push(
            Table::Exercises,
            merge_table(conn, &data.exercises, &mut ties, now)?,
        );
        self.checkpoint(Table::Exercises)?;

        report.push(
            Table::Workouts,
            merge_table(conn, &data.workouts, &mut ties, now)?,
        );
        self.checkpoint(Table::Workouts)?;

        report.push(
            Table::WorkoutExercises,
            merge_table(conn, &data.workout_exercises, &mut ties, now)?,
        );
        self.checkpoint(Table::WorkoutExercises)?;

        report.push(Table::Sets, merge_table(conn, &data.sets, &mut ties, now)?);
        self.checkpoint(Table::Sets)?;

        report.push(
            Table::WorkoutTemplates,
            merge_table(conn, &data.workout_templates, &mut ties, now)?,
        );
        self.checkpoint(Table::WorkoutTemplates)?;

        // Remote log entries first, so a tie already logged elsewhere is not logged twice
        let mut log = merge_table(conn, &data.conflict_log, &mut ties, now)?;
        log.inserted += record_ties(conn, ties)?;
        report.push(Table::ConflictLog, log);
        self.checkpoint(Table::ConflictLog)?;

        Ok(report)
    }

    fn merge_settings(
        &self,
        conn: &Connection,
        remote: &[Settings],
        ties: &mut Vec<ConflictRecord>,
        now: i64,
    ) -> Result<TableReport> {
        let mut counts = TableReport::default();
        let Some(incoming) = remote.iter().max_by_key(|settings| settings.updated_at) else {
            return Ok(counts);
        };
        counts.skipped = remote.len() - 1;

        let repo = SqliteRecordRepository::<Settings>::new(conn);
        let Some(local) = repo.first()? else {
            let mut settings = incoming.clone();
            if settings.uuid.trim().is_empty() {
                settings.uuid = new_record_uuid();
            }
            repo.insert(&settings)?;
            counts.inserted += 1;
            return Ok(counts);
        };

        if self.settings_policy == SettingsMergePolicy::KeepLocal {
            counts.kept_local += 1;
            return Ok(counts);
        }

        let mut settings = incoming.clone();
        if settings.uuid.trim().is_empty() {
            settings.uuid.clone_from(&local.uuid);
        }

        match settings.updated_at.cmp(&local.updated_at) {
            Ordering::Greater => {
                let local_id = local
                    .id
                    .ok_or_else(|| Error::NotFound(local.uuid.clone()))?;
                repo.replace(local_id, &settings)?;
                counts.updated += 1;
            }
            Ordering::Less => counts.kept_local += 1,
            Ordering::Equal => {
                // Uuids may legitimately differ between two singletons
                settings.uuid.clone_from(&local.uuid);
                if same_content(&local, &settings)? {
                    counts.unchanged += 1;
                } else {
                    counts.kept_local += 1;
                    counts.conflicts += 1;
                    ties.push(tie_entry(EntityType::Settings, &local, &settings, now)?);
                }
            }
        }
        Ok(counts)
    }

    #[cfg(test)]
    fn checkpoint(&self, table: Table) -> Result<()> {
        if self.fail_after == Some(table) {
            return Err(Error::MergeTransaction(format!(
                "injected fault after {table}"
            )));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[allow(clippy::unused_self)]
    const fn checkpoint(&self, _table: Table) -> Result<()> {
        Ok(())
    }
}

fn into_merge_error<E: Into<Error>>(error: E) -> Error {
    match error.into() {
        error @ Error::MergeTransaction(_) => error,
        error => Error::MergeTransaction(error.to_string()),
    }
}

/// Last-write-wins merge of one uuid-keyed table
fn merge_table<T: SyncRecord>(
    conn: &Connection,
    remote: &[T],
    ties: &mut Vec<ConflictRecord>,
    now: i64,
) -> Result<TableReport> {
    let repo = SqliteRecordRepository::<T>::new(conn);
    let mut counts = TableReport::default();

    for record in remote {
        if record.uuid().trim().is_empty() {
            tracing::warn!("Skipping {} record without uuid", T::TABLE);
            counts.skipped += 1;
            continue;
        }

        let Some(local) = repo.get_by_uuid(record.uuid())? else {
            repo.insert(record)?;
            counts.inserted += 1;
            continue;
        };

        match record.updated_at().cmp(&local.updated_at()) {
            Ordering::Greater => {
                let local_id = local
                    .local_id()
                    .ok_or_else(|| Error::NotFound(record.uuid().to_string()))?;
                repo.replace(local_id, record)?;
                counts.updated += 1;
            }
            Ordering::Less => counts.kept_local += 1,
            Ordering::Equal => {
                if same_content(&local, record)? {
                    counts.unchanged += 1;
                    continue;
                }
                counts.kept_local += 1;
                if let Some(entity_type) = T::TABLE.entity_type() {
                    counts.conflicts += 1;
                    ties.push(tie_entry(entity_type, &local, record, now)?);
                }
            }
        }
    }

    Ok(counts)
}

/// Compare two versions of a record, ignoring the device-local id
fn same_content<T: SyncRecord>(local: &T, remote: &T) -> Result<bool> {
    Ok(content(local)? == content(remote)?)
}

fn content<T: SyncRecord>(record: &T) -> Result<serde_json::Value> {
    let mut record = record.clone();
    record.set_local_id(None);
    Ok(serde_json::to_value(record)?)
}

/// Conflict log entry for a tie; the local version was kept.
///
/// The uuid is derived from the record and its timestamp, so the same tie
/// always maps to the same entry on every device.
fn tie_entry<T: SyncRecord>(
    entity_type: EntityType,
    local: &T,
    remote: &T,
    now: i64,
) -> Result<ConflictRecord> {
    let key = format!(
        "{}:{}:{}",
        T::TABLE.sql_name(),
        local.uuid(),
        local.updated_at()
    );

    Ok(ConflictRecord {
        id: None,
        uuid: Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string(),
        entity_type,
        entity_id: local.uuid().to_string(),
        local_updated_at: local.updated_at(),
        remote_updated_at: remote.updated_at(),
        resolved_at: Some(now),
        resolution: Some(Resolution::Local),
        snapshot: Some(content(remote)?),
        updated_at: now,
        deleted_at: None,
    })
}

fn record_ties(conn: &Connection, ties: Vec<ConflictRecord>) -> Result<usize> {
    let repo = SqliteRecordRepository::<ConflictRecord>::new(conn);
    let mut written = 0;

    for entry in ties {
        if repo.get_by_uuid(&entry.uuid)?.is_some() {
            continue;
        }
        tracing::warn!(
            "Equal timestamps with different content for {:?} {}; kept local version",
            entry.entity_type,
            entry.entity_id
        );
        repo.insert(&entry)?;
        written += 1;
    }

    Ok(written)
}
