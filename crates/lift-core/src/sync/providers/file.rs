//! Local file transport
//!
//! Export writes a dated snapshot file the user can carry to another
//! device. Import reads a file the user picked.

use std::path::{Path, PathBuf};

use chrono::DateTime;

use crate::error::{Error, Result};
use crate::sync::provider::SyncProvider;
use crate::sync::snapshot::{encode_snapshot, parse_snapshot, Snapshot};

pub const DEFAULT_FILE_PREFIX: &str = "strength-journal";

#[derive(Debug, Clone)]
pub struct FileProvider {
    export_dir: PathBuf,
    file_prefix: String,
    import_file: Option<PathBuf>,
}

impl FileProvider {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            import_file: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim();
        if !prefix.is_empty() {
            self.file_prefix = prefix.to_string();
        }
        self
    }

    /// Make `pull` read this file instead of reporting nothing to merge
    #[must_use]
    pub fn with_import_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.import_file = Some(path.into());
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// `<prefix>-<YYYY-MM-DD>.json`, dated by `exported_at` in UTC
    pub fn export_file_name(&self, exported_at: i64) -> String {
        let date = DateTime::from_timestamp_millis(exported_at).unwrap_or_default();
        format!("{}-{}.json", self.file_prefix, date.format("%Y-%m-%d"))
    }

    pub fn export_path(&self, exported_at: i64) -> PathBuf {
        self.export_dir.join(self.export_file_name(exported_at))
    }

    /// Read and parse a user-selected snapshot file
    pub async fn import_file(path: &Path) -> Result<Snapshot> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(Error::InvalidInput(format!(
                "{} is not a .json file",
                path.display()
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::ProviderIo(format!("{}: {e}", path.display())))?;
        parse_snapshot(&bytes)
    }
}

impl SyncProvider for FileProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    async fn pull(&self) -> Result<Option<Snapshot>> {
        match &self.import_file {
            Some(path) => Self::import_file(path).await.map(Some),
            None => Ok(None),
        }
    }

    async fn push(&self, snapshot: &Snapshot) -> Result<()> {
        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .map_err(|e| Error::ProviderIo(format!("{}: {e}", self.export_dir.display())))?;

        let path = self.export_path(snapshot.exported_at);
        let bytes = encode_snapshot(snapshot)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::ProviderIo(format!("{}: {e}", path.display())))?;

        tracing::info!(
            "Exported {} records to {}",
            snapshot.record_count(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::sync::snapshot::create_snapshot;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    // 2024-03-05T12:00:00Z
    const EXPORTED_AT: i64 = 1_709_640_000_000;

    fn empty_snapshot() -> Snapshot {
        let db = Database::open_in_memory().unwrap();
        create_snapshot(db.connection(), "device", EXPORTED_AT).unwrap()
    }

    #[test]
    fn test_export_file_name() {
        let provider = FileProvider::new("/tmp");
        assert_eq!(
            provider.export_file_name(EXPORTED_AT),
            "strength-journal-2024-03-05.json"
        );

        let provider = provider.with_prefix("lift");
        assert_eq!(provider.export_file_name(EXPORTED_AT), "lift-2024-03-05.json");

        let provider = provider.with_prefix("   ");
        assert_eq!(provider.export_file_name(0), "lift-1970-01-01.json");
    }

    #[tokio::test]
    async fn test_pull_without_import_file_is_none() {
        let dir = tempdir().unwrap();
        let provider = FileProvider::new(dir.path());
        assert!(provider.pull().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_push_then_import() {
        let dir = tempdir().unwrap();
        let provider = FileProvider::new(dir.path().join("exports"));
        let snapshot = empty_snapshot();

        provider.push(&snapshot).await.unwrap();
        let path = provider.export_path(EXPORTED_AT);
        assert!(path.exists());

        let armed = provider.clone().with_import_file(&path);
        assert_eq!(armed.pull().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_import_rejects_non_json_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.txt");
        std::fs::write(&path, "{}").unwrap();

        assert!(matches!(
            FileProvider::import_file(&path).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_import_reports_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, "{\"schemaVersion\": 1}").unwrap();

        assert!(matches!(
            FileProvider::import_file(&path).await,
            Err(Error::MalformedSnapshot(_))
        ));
    }

    #[tokio::test]
    async fn test_import_missing_file_is_provider_io() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileProvider::import_file(&dir.path().join("missing.json")).await,
            Err(Error::ProviderIo(_))
        ));
    }
}
