//! `StateStore` trait, the durable key/value interface backing the state model.

use async_trait::async_trait;

use crate::error::StoreError;

/// Backend-agnostic persisted state store.
///
/// Values are JSON documents keyed by string. Every `set` is atomic at the
/// key level: after a crash the key holds either the previous or the new
/// value, never a partial one.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get a value, `None` when the key was never (fully) written.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Whether a key is present.
    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}
