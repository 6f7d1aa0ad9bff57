//! Snapshot persistence: one `<database>.json` file per database under a metadata directory.

use crate::catalog::Snapshot;
use crate::error::ConfigError;
use crate::sql::check_identifier;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `database`. The name is checked first so it cannot escape the directory.
    pub fn path_for(&self, database: &str) -> Result<PathBuf, ConfigError> {
        check_identifier(database)?;
        Ok(self.dir.join(format!("{}.json", database)))
    }

    /// Overwrite the file for `snapshot.database` with the whole snapshot.
    /// Written to a temp file private to this call and renamed so readers never see half a file.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<PathBuf, ConfigError> {
        let path = self.path_for(&snapshot.database)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self
            .dir
            .join(format!("{}.json.{}.tmp", snapshot.database, uuid::Uuid::new_v4()));
        let written = match tokio::fs::write(&tmp, body).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::info!(database = %snapshot.database, path = %path.display(), "snapshot persisted");
        Ok(path)
    }

    /// Read the persisted snapshot for `database`; `None` when nothing was persisted.
    pub async fn load(&self, database: &str) -> Result<Option<Snapshot>, ConfigError> {
        let path = self.path_for(database)?;
        let body = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&body)?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, TableDef};

    fn snapshot() -> Snapshot {
        Snapshot::new(
            "shop",
            vec![
                TableDef::new(
                    "product",
                    vec![ColumnDef::new("id", "integer"), ColumnDef::new("price", "numeric")],
                    Some("id".into()),
                ),
                TableDef::new("audit", vec![ColumnDef::new("line", "text")], None),
            ],
        )
    }

    #[tokio::test]
    async fn persisted_snapshot_reloads_equal() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("metadata"));
        let path = store.save(&snapshot()).await.unwrap();
        assert_eq!(path, dir.path().join("metadata").join("shop.json"));

        let back = store.load("shop").await.unwrap().unwrap();
        assert_eq!(back.database, "shop");
        assert_eq!(back.table_count, 2);
        assert_eq!(back, snapshot());
    }

    #[tokio::test]
    async fn save_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.save(&snapshot()).await.unwrap();
        store.save(&Snapshot::empty("shop")).await.unwrap();
        let back = store.load("shop").await.unwrap().unwrap();
        assert_eq!(back.table_count, 0);
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_of_one_database_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let s = if i % 2 == 0 { snapshot() } else { Snapshot::empty("shop") };
                store.save(&s).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        let back = store.load("shop").await.unwrap().unwrap();
        assert!(back == snapshot() || back == Snapshot::empty("shop"));
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.load("nothing_here").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shop.json"), b"{\"DB\": \"sh").unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(matches!(store.load("shop").await, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unsafe_names_never_become_paths() {
        let store = SnapshotStore::new("/tmp/meta");
        assert!(matches!(store.path_for("../secret"), Err(ConfigError::InvalidIdentifier(_))));
        assert!(store.path_for("shop").is_ok());
    }
}
