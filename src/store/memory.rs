use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use super::{PreferenceStore, Preferences, StorageArea, StorageChange, change_channel, publish};
use crate::error::Result;

/// In-process store, mostly for tests and embedding
#[derive(Debug)]
pub struct MemoryStore {
    area: StorageArea,
    prefs: RwLock<Preferences>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    pub fn new(area: StorageArea) -> Self {
        Self::with_preferences(area, Preferences::default())
    }

    pub fn with_preferences(area: StorageArea, prefs: Preferences) -> Self {
        Self {
            area,
            prefs: RwLock::new(prefs),
            changes: change_channel(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StorageArea::Sync)
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get(&self) -> Result<Preferences> {
        Ok(self.prefs.read().await.clone())
    }

    async fn set(&self, prefs: Preferences) -> Result<()> {
        let mut current = self.prefs.write().await;
        let old = std::mem::replace(&mut *current, prefs);
        publish(&self.changes, self.area, &old, &current);
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
    async fn test_set_notifies_changed_keys() {
        let store = MemoryStore::default();
        let mut rx = store.subscribe();

        let mut prefs = store.get().await.unwrap();
        prefs.set_default(Quality::Hd720);
        store.set(prefs.clone()).await.unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.area, StorageArea::Sync);
        assert!(change.touches(PreferenceKey::DefaultQuality));
        assert!(!change.touches(PreferenceKey::ChannelQualities));
        assert_eq!(store.get().await.unwrap().default_quality, "hd720");

        // identical write is silent
        store.set(prefs).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
