//! Bucket index (spec §4.5): one append-only log per bucket mapping key
//! names to the `LogRef` of their current blob, looked up by scanning
//! backward from the latest entry until a name match is found.

use std::sync::Arc;

use base64::Engine;
use bytes::Bytes;
use burrow_woof::{CreateOutcome, Woof};

use crate::error::Error;
use crate::shard::LogRef;

/// Keys longer than this are rejected at the object-service layer before
/// they ever reach the index; this bounds the fixed-size index record.
pub const MAX_KEY_LEN: usize = 1024;

pub const INDEX_RECORD_SIZE: u32 = (2 + MAX_KEY_LEN + 16) as u32;

/// Default capacity, in entries, of a bucket's index log (spec §4.5).
pub const DEFAULT_INDEX_CAPACITY: u64 = 128 * 1024;

const NO_REF_LOG_ID: u64 = u64::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketIndexEntry {
    pub key: String,
    /// `None` marks a tombstone written by `remove`.
    pub blob_ref: Option<LogRef>,
}

impl BucketIndexEntry {
    fn encode(&self) -> Vec<u8> {
        let key_bytes = self.key.as_bytes();
        assert!(key_bytes.len() <= MAX_KEY_LEN, "key exceeds MAX_KEY_LEN");
        let mut buf = Vec::with_capacity(INDEX_RECORD_SIZE as usize);
        buf.extend_from_slice(&(key_bytes.len() as u16).to_le_bytes());
        buf.extend_from_slice(key_bytes);
        buf.resize(2 + MAX_KEY_LEN, 0);
        let (log_id, seqno) = match self.blob_ref {
            Some(r) => (r.log_id, r.seqno),
            None => (NO_REF_LOG_ID, 0),
        };
        buf.extend_from_slice(&log_id.to_le_bytes());
        buf.extend_from_slice(&seqno.to_le_bytes());
        buf
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < INDEX_RECORD_SIZE as usize {
            return None;
        }
        let key_len = u16::from_le_bytes(buf[0..2].try_into().ok()?) as usize;
        let key = String::from_utf8(buf.get(2..2 + key_len)?.to_vec()).ok()?;
        let ref_offset = 2 + MAX_KEY_LEN;
        let log_id = u64::from_le_bytes(buf[ref_offset..ref_offset + 8].try_into().ok()?);
        let seqno = u64::from_le_bytes(buf[ref_offset + 8..ref_offset + 16].try_into().ok()?);
        let blob_ref = if log_id == NO_REF_LOG_ID {
            None
        } else {
            Some(LogRef { log_id, seqno })
        };
        Some(Self { key, blob_ref })
    }
}

/// The index log for one bucket. Lookup is O(k) in recent writes since the
/// last write to the key being looked up; because the log is bounded,
/// keys whose last write has scrolled off the back become unreachable —
/// an accepted limitation (spec §4.5), not a bug.
pub struct BucketIndex {
    woof: Arc<dyn Woof>,
    log_name: String,
}

impl BucketIndex {
    pub async fn open_or_create(woof: Arc<dyn Woof>, bucket: &str, capacity: u64) -> Result<Self, Error> {
        // spec.md's glossary: `indexLogName = base64(name)` (also §6.5).
        let encoded = base64::engine::general_purpose::STANDARD.encode(bucket);
        let log_name = format!("bucket-index-{encoded}.woof");
        if let CreateOutcome::Created = woof.create(&log_name, INDEX_RECORD_SIZE, capacity).await? {
            tracing::info!(bucket, log_name, "created bucket index");
        }
        Ok(Self { woof, log_name })
    }

    pub async fn add(&self, key: &str, blob_ref: LogRef) -> Result<(), Error> {
        let entry = BucketIndexEntry {
            key: key.to_string(),
            blob_ref: Some(blob_ref),
        };
        self.woof.append(&self.log_name, Bytes::from(entry.encode())).await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), Error> {
        let entry = BucketIndexEntry {
            key: key.to_string(),
            blob_ref: None,
        };
        self.woof.append(&self.log_name, Bytes::from(entry.encode())).await?;
        Ok(())
    }

    /// Scans backward from the latest entry for a matching key. Returns
    /// `Ok(None)` both when the key was never written and when its most
    /// recent write was a tombstone.
    pub async fn lookup(&self, key: &str) -> Result<Option<LogRef>, Error> {
        let Some(latest) = self.woof.latest_seqno(&self.log_name).await? else {
            return Ok(None);
        };
        let mut seqno = latest;
        loop {
            match self.woof.get(&self.log_name, seqno).await? {
                Some(bytes) => {
                    let entry = BucketIndexEntry::decode(&bytes).ok_or_else(|| Error::CorruptChain {
                        log_id: 0,
                        seqno,
                        reason: "undecodable bucket index record".to_string(),
                    })?;
                    if entry.key == key {
                        return Ok(entry.blob_ref);
                    }
                }
                // evicted by wraparound before we reached it: unreachable, same as not-found
                None => return Ok(None),
            }
            if seqno == 0 {
                return Ok(None);
            }
            seqno -= 1;
        }
    }
}
