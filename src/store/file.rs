use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, broadcast};

use super::{PreferenceStore, Preferences, StorageArea, StorageChange, change_channel, publish};
use crate::error::Result;

/// Preferences persisted as a JSON document on disk
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    area: StorageArea,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            area: StorageArea::Sync,
            write_lock: Mutex::new(()),
            changes: change_channel(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Preferences> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PreferenceStore for FileStore {
    async fn get(&self) -> Result<Preferences> {
        self.load().await
    }

    async fn set(&self, prefs: Preferences) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let old = match self.load().await {
            Ok(old) => old,
            Err(e) => {
                tracing::warn!(
                    "Replacing unreadable preferences at {}: {}",
                    self.path.display(),
                    e
                );
                Preferences::default()
            }
        };

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&prefs)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!("Preferences written to {}", self.path.display());
        publish(&self.changes, self.area, &old, &prefs);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    fn area(&self) -> StorageArea {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Quality;
    use crate::store::PreferenceKey;

    #[tokio::test]
    async fn test_missing_file_reads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.get().await.unwrap(), Preferences::default());
    }

    #[tokio::test]
    async fn test_write_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let store = FileStore::new(&path);
        let mut rx = store.subscribe();
        let mut prefs = Preferences::default();
        prefs.set_channel("chA", Quality::Hd1440);
        store.set(prefs.clone()).await.unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.keys, vec![PreferenceKey::ChannelQualities]);

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get().await.unwrap(), prefs);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"channelQualities\""));
    }

    #[tokio::test]
    async fn test_set_over_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        let mut rx = store.subscribe();
        let mut prefs = Preferences::default();
        prefs.set_default(Quality::Hd720);
        store.set(prefs.clone()).await.unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.keys, vec![PreferenceKey::DefaultQuality]);
        assert_eq!(store.get().await.unwrap(), prefs);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileStore::new(&path).get().await.is_err());
    }
}
