#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::KeyValueStore;
use crate::domain::models::StorageKey;

/// Keeps every key in a single JSON object on disk. Each write rewrites the
/// whole file.
pub struct FileStore {
    pub file_path: path::PathBuf,
}

impl Default for FileStore {
    fn default() -> FileStore {
        let state_dir = path::PathBuf::from(Config::get(ConfigKey::StateDir));
        return FileStore::new(state_dir);
    }
}

impl FileStore {
    pub fn new(state_dir: path::PathBuf) -> FileStore {
        return FileStore {
            file_path: state_dir.join("storage.json"),
        };
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.file_path.exists() {
            return Ok(BTreeMap::new());
        }

        let payload = fs::read_to_string(&self.file_path).await?;
        if payload.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        return match serde_json::from_str::<BTreeMap<String, String>>(&payload) {
            Ok(values) => Ok(values),
            Err(err) => {
                tracing::warn!(
                    error = ?err,
                    path = ?self.file_path,
                    "Storage file is not valid, treating it as empty"
                );
                Ok(BTreeMap::new())
            }
        };
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_json::to_string_pretty(values)?;
        let mut file = fs::File::create(&self.file_path).await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        return Ok(());
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let mut values = self.read_all().await?;
        return Ok(values.remove(&key.to_string()));
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        return self.write_all(&values).await;
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        let mut values = self.read_all().await?;
        if values.remove(&key.to_string()).is_none() {
            return Ok(());
        }

        return self.write_all(&values).await;
    }
}
