use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::models::KeyValueStore;
use crate::domain::models::StorageKey;

/// Storage that lives as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    values: DashMap<StorageKey, String>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        return Ok(self.values.get(&key).map(|val| return val.to_string()));
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.values.insert(key, value.to_string());
        return Ok(());
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        self.values.remove(&key);
        return Ok(());
    }
}
