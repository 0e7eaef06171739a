use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;

/// Keys the client persists between runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StorageKey {
    /// Raw bearer token.
    Token,
    /// JSON serialized user profile.
    User,
}

/// Durable local key-value storage. Writes are last-writer-wins and nothing
/// groups writes across keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<String>>;

    async fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    async fn remove(&self, key: StorageKey) -> Result<()>;
}

pub type StorageBox = std::sync::Arc<dyn KeyValueStore>;
