//! `BlobStore`: the facade the object service talks to, composing the
//! sharded blob filesystem (§4.4) with one bucket index (§4.5) per bucket.
//! Buckets auto-exist (spec §6.2's `PUT /:bucket` is a no-op) — there is no
//! bucket-creation step here, only lazy first-use index creation.

use std::collections::HashMap;
use std::sync::Arc;

use burrow_woof::Woof;
use tokio::sync::RwLock;

use crate::error::Error;
use crate::index::{BucketIndex, DEFAULT_INDEX_CAPACITY};
use crate::logwriter::{read_buffer, write_buffer, LogWriter};
use crate::shard::SHARDS_PER_LOG;

pub struct BlobStore {
    woof: Arc<dyn Woof>,
    writer: LogWriter,
    index_capacity: u64,
    indexes: RwLock<HashMap<String, Arc<BucketIndex>>>,
}

impl BlobStore {
    pub async fn new(woof: Arc<dyn Woof>) -> Result<Self, Error> {
        Self::with_capacities(woof, SHARDS_PER_LOG, DEFAULT_INDEX_CAPACITY).await
    }

    pub async fn with_capacities(woof: Arc<dyn Woof>, shard_log_capacity: u64, index_capacity: u64) -> Result<Self, Error> {
        let writer = LogWriter::create(woof.clone(), shard_log_capacity).await?;
        Ok(Self {
            woof,
            writer,
            index_capacity,
            indexes: RwLock::new(HashMap::new()),
        })
    }

    async fn index_for(&self, bucket: &str) -> Result<Arc<BucketIndex>, Error> {
        if let Some(idx) = self.indexes.read().await.get(bucket) {
            return Ok(idx.clone());
        }
        let mut guard = self.indexes.write().await;
        if let Some(idx) = guard.get(bucket) {
            return Ok(idx.clone());
        }
        let idx = Arc::new(BucketIndex::open_or_create(self.woof.clone(), bucket, self.index_capacity).await?);
        guard.insert(bucket.to_string(), idx.clone());
        Ok(idx)
    }

    /// Writes `data` as the new current version of `bucket`/`key`.
    pub async fn put(&self, bucket: &str, key: &str, data: &[u8]) -> Result<(), Error> {
        let blob_ref = write_buffer(&self.writer, data).await?;
        self.index_for(bucket).await?.add(key, blob_ref).await
    }

    /// Returns `Ok(None)` when the key was never written, was removed, or
    /// its last write has scrolled off the bucket index's bounded log.
    pub async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, Error> {
        match self.index_for(bucket).await?.lookup(key).await? {
            Some(blob_ref) => Ok(Some(read_buffer(&self.woof, blob_ref).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_woof::FileWoofStore;

    async fn store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let woof: Arc<dyn Woof> = Arc::new(FileWoofStore::open(dir.path()).unwrap());
        let store = BlobStore::with_capacities(woof, 4, 16).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let (_dir, store) = store().await;
        store.put("b1", "k1", b"hello").await.unwrap();
        assert_eq!(store.get("b1", "k1").await.unwrap().unwrap(), b"hello");
    }

    #[tokio::test]
    async fn get_of_unwritten_key_is_none() {
        let (_dir, store) = store().await;
        assert_eq!(store.get("b1", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn separate_buckets_do_not_share_keys() {
        let (_dir, store) = store().await;
        store.put("b1", "k", b"one").await.unwrap();
        store.put("b2", "k", b"two").await.unwrap();
        assert_eq!(store.get("b1", "k").await.unwrap().unwrap(), b"one");
        assert_eq!(store.get("b2", "k").await.unwrap().unwrap(), b"two");
    }

    #[tokio::test]
    async fn overwriting_a_key_returns_the_newest_value() {
        let (_dir, store) = store().await;
        store.put("b1", "k", b"v1").await.unwrap();
        store.put("b1", "k", b"v2").await.unwrap();
        assert_eq!(store.get("b1", "k").await.unwrap().unwrap(), b"v2");
    }
}
