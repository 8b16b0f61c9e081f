//! Key-value store seam.
//!
//! The game keeps all of its durable state in an external key-value service
//! that only offers get and put by key. There is no compare-and-swap and no
//! multi-key transaction, so anything built on top is read-modify-write.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A durable string-to-string store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing whatever was there.
    async fn put(&self, key: &str, value: String) -> Result<()>;
}

/// In-memory store. Loses everything on drop.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get() {
        let kv = MemoryKv::new();

        kv.put("number", "5".into()).await.unwrap();
        assert_eq!(kv.get("number").await.unwrap().as_deref(), Some("5"));
        assert_eq!(kv.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites() {
        let kv = MemoryKv::with_entries([("number", "5")]);
        kv.put("number", "6".into()).await.unwrap();

        assert_eq!(kv.get("number").await.unwrap().as_deref(), Some("6"));
    }
}
