//! Durable local key/value state
//!
//! A small string map persisted as JSON, the same role browser local storage
//! plays for a web front-end. Every `set` writes through to disk.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key holding the last known on-chain transaction count
pub const TRANSACTION_COUNT_KEY: &str = "transactionCount";

/// Key the CLI uses to remember that the wallet was authorized
pub const WALLET_AUTHORIZED_KEY: &str = "walletAuthorized";

#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Storage that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from a file, or start empty if the file is missing or unreadable
    ///
    /// An unreadable file is replaced on the next `set`.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).await;

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened local storage");

        Self {
            path: Some(path),
            entries,
        }
    }

    /// Re-read the backing file, picking up writes from other processes
    pub async fn reload(&mut self) {
        if let Some(ref path) = self.path {
            self.entries = load_entries(path).await;
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// Store a value and persist immediately
    pub async fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.entries.insert(key.to_string(), value.into());
        self.flush().await
    }

    pub async fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        if let Some(ref path) = self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string_pretty(&self.entries)?;
            tokio::fs::write(path, content).await?;
        }
        Ok(())
    }
}

async fn load_entries(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        return BTreeMap::new();
    }

    let loaded = match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).map_err(Error::from),
        Err(e) => Err(Error::from(e)),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable local storage");
        BTreeMap::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let mut storage = LocalStorage::in_memory();
        assert_eq!(storage.get(TRANSACTION_COUNT_KEY), None);

        storage.set(TRANSACTION_COUNT_KEY, "3").await.unwrap();
        assert_eq!(storage.get(TRANSACTION_COUNT_KEY), Some("3"));

        storage.remove(TRANSACTION_COUNT_KEY).await.unwrap();
        assert_eq!(storage.get(TRANSACTION_COUNT_KEY), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("storage.json");

        let mut storage = LocalStorage::open(&path).await;
        storage.set(TRANSACTION_COUNT_KEY, "12").await.unwrap();
        storage.set(WALLET_AUTHORIZED_KEY, "true").await.unwrap();

        let reopened = LocalStorage::open(&path).await;
        assert_eq!(reopened.get(TRANSACTION_COUNT_KEY), Some("12"));
        assert_eq!(reopened.get(WALLET_AUTHORIZED_KEY), Some("true"));
    }

    #[tokio::test]
    async fn test_corrupt_file_opens_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let mut storage = LocalStorage::open(&path).await;
        assert_eq!(storage.get(TRANSACTION_COUNT_KEY), None);

        storage.set(TRANSACTION_COUNT_KEY, "4").await.unwrap();
        let reopened = LocalStorage::open(&path).await;
        assert_eq!(reopened.get(TRANSACTION_COUNT_KEY), Some("4"));
    }

    #[tokio::test]
    async fn test_reload_sees_other_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut watcher = LocalStorage::open(&path).await;
        let mut writer = LocalStorage::open(&path).await;
        writer.set(WALLET_AUTHORIZED_KEY, "true").await.unwrap();
        assert_eq!(watcher.get(WALLET_AUTHORIZED_KEY), None);

        watcher.reload().await;
        assert_eq!(watcher.get(WALLET_AUTHORIZED_KEY), Some("true"));

        writer.remove(WALLET_AUTHORIZED_KEY).await.unwrap();
        watcher.reload().await;
        assert_eq!(watcher.get(WALLET_AUTHORIZED_KEY), None);
    }
}
