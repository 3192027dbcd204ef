use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tower_sessions::Session;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session record unavailable: {0}")]
    Unavailable(String),
}

/// Durable per-client key-value slot that outlives a single request.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn write(&self, key: &str, value: String) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl SessionStorage for Session {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Session::get::<String>(self, key)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        Session::insert(self, key, value)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        Session::remove_value(self, key)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

/// Process-local storage; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}
