//! Persistent key-value storage using RocksDB.

use crate::error::Result;
use async_trait::async_trait;
use lettercount_core::KvStore;
use rocksdb::{Options, DB};
use std::path::Path;

/// RocksDB-backed [`KvStore`].
///
/// Keys and values are stored as UTF-8 bytes, unprefixed, so legacy
/// per-field keys sit next to the consolidated record.
pub struct RocksKv {
    db: DB,
}

impl RocksKv {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }
}

fn storage_error(e: rocksdb::Error) -> lettercount_core::Error {
    lettercount_core::Error::Storage(e.to_string())
}

#[async_trait]
impl KvStore for RocksKv {
    async fn get(&self, key: &str) -> lettercount_core::Result<Option<String>> {
        match self.db.get(key.as_bytes()).map_err(storage_error)? {
            Some(data) => String::from_utf8(data).map(Some).map_err(|e| {
                lettercount_core::Error::Storage(format!("Non-UTF-8 value under {}: {}", key, e))
            }),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String) -> lettercount_core::Result<()> {
        self.db
            .put(key.as_bytes(), value.as_bytes())
            .map_err(storage_error)
    }
}
