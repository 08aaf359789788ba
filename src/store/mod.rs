//! Persistent quality preferences.
//!
//! Two logical keys live in the store: the default quality and the per-channel
//! map. Writers get back nothing but an ack; readers learn about changes through
//! a broadcast of [`StorageChange`] values.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use crate::core::Quality;
use crate::error::Result;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

const CHANGE_CAPACITY: usize = 16;

/// Storage partition a record lives in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    Local,
    #[default]
    Sync,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceKey {
    DefaultQuality,
    ChannelQualities,
}

/// Change notification delivered to subscribers after a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub keys: Vec<PreferenceKey>,
}

impl StorageChange {
    pub fn touches(&self, key: PreferenceKey) -> bool {
        self.keys.contains(&key)
    }
}

fn default_quality() -> String {
    Quality::Auto.to_string()
}

/// The whole preference record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_quality")]
    pub default_quality: String,
    #[serde(default)]
    pub channel_qualities: BTreeMap<String, String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            channel_qualities: BTreeMap::new(),
        }
    }
}

impl Preferences {
    /// Quality wanted for a page of `channel`, falling back to the default
    pub fn target_for(&self, channel: Option<&str>) -> &str {
        channel
            .and_then(|c| self.channel_qualities.get(c))
            .map(String::as_str)
            .unwrap_or(&self.default_quality)
    }

    pub fn set_default(&mut self, quality: Quality) {
        self.default_quality = quality.to_string();
    }

    pub fn set_channel(&mut self, channel: &str, quality: Quality) {
        self.channel_qualities
            .insert(channel.trim().to_string(), quality.to_string());
    }

    /// Returns whether the channel had an entry
    pub fn remove_channel(&mut self, channel: &str) -> bool {
        self.channel_qualities.remove(channel.trim()).is_some()
    }

    /// Keys whose value differs between `self` and `other`
    pub fn changed_keys(&self, other: &Preferences) -> Vec<PreferenceKey> {
        let mut keys = Vec::new();
        if self.default_quality != other.default_quality {
            keys.push(PreferenceKey::DefaultQuality);
        }
        if self.channel_qualities != other.channel_qualities {
            keys.push(PreferenceKey::ChannelQualities);
        }
        keys
    }
}

/// Key-value store owned by the host platform.
///
/// Implementations serialize writes internally; callers never hold a lock.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self) -> Result<Preferences>;

    /// Replace the record and notify subscribers of the keys that changed
    async fn set(&self, prefs: Preferences) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;

    fn area(&self) -> StorageArea;
}

pub(crate) fn change_channel() -> broadcast::Sender<StorageChange> {
    broadcast::channel(CHANGE_CAPACITY).0
}

pub(crate) fn publish(
    tx: &broadcast::Sender<StorageChange>,
    area: StorageArea,
    old: &Preferences,
    new: &Preferences,
) {
    let keys = old.changed_keys(new);
    if keys.is_empty() {
        return;
    }
    // no subscribers is fine
    let _ = tx.send(StorageChange { area, keys });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_override() {
        let mut prefs = Preferences::default();
        prefs.set_channel("chA", Quality::Hd720);

        assert_eq!(prefs.target_for(Some("chA")), "hd720");
        assert_eq!(prefs.target_for(Some("chB")), "auto");
        assert_eq!(prefs.target_for(None), "auto");
    }

    #[test]
    fn test_missing_keys_deserialize_to_defaults() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, Preferences::default());

        let prefs: Preferences =
            serde_json::from_str(r#"{"channelQualities":{"chA":"hd1080"}}"#).unwrap();
        assert_eq!(prefs.default_quality, "auto");
        assert_eq!(prefs.target_for(Some("chA")), "hd1080");
    }

    #[test]
    fn test_changed_keys() {
        let old = Preferences::default();
        let mut new = old.clone();
        assert!(old.changed_keys(&new).is_empty());

        new.set_default(Quality::Hd1080);
        assert_eq!(old.changed_keys(&new), vec![PreferenceKey::DefaultQuality]);

        new.set_channel(" chA ", Quality::Small);
        assert_eq!(
            old.changed_keys(&new),
            vec![PreferenceKey::DefaultQuality, PreferenceKey::ChannelQualities]
        );
        assert!(new.remove_channel("chA"));
        assert!(!new.remove_channel("chA"));
    }
}
