//! `StorageLog` + `LogWriter` (spec §4.4): `LogWriter` owns the current
//! storage log and rolls to a fresh one once it fills, so `write_buffer`
//! never has to think about log boundaries.
//!
//! The underlying `Woof` trait evicts silently on wraparound rather than
//! erroring (spec §4.1's "invalid sentinel" is rendered as `Option::None`
//! here, not as an out-of-space error) — `StorageLog` polices capacity
//! itself, checking `latest_seqno() + 1 >= capacity` before ever calling
//! `append`, so this crate's own `OutOfSpace` is raised deterministically
//! before that silent eviction could occur.

use std::sync::Arc;

use bytes::Bytes;
use burrow_woof::Woof;
use rand::Rng;
use tokio::sync::Mutex;

use crate::error::Error;
use crate::shard::{LogRef, Shard, SHARDS_PER_LOG, SHARD_BYTES, SHARD_RECORD_SIZE};

/// One capacity-bounded log of shard records, identified by a random
/// 64-bit id (`shard-<id>.woof` on disk).
pub struct StorageLog {
    woof: Arc<dyn Woof>,
    name: String,
    log_id: u64,
    capacity: u64,
}

impl StorageLog {
    pub async fn create(woof: Arc<dyn Woof>, log_id: u64, capacity: u64) -> Result<Self, Error> {
        let name = LogRef { log_id, seqno: 0 }.log_name();
        woof.create(&name, SHARD_RECORD_SIZE, capacity).await?;
        Ok(Self {
            woof,
            name,
            log_id,
            capacity,
        })
    }

    pub fn log_id(&self) -> u64 {
        self.log_id
    }

    pub async fn append(&self, shard: &Shard) -> Result<LogRef, Error> {
        let latest = self.woof.latest_seqno(&self.name).await?;
        let next_seqno = latest.map(|s| s + 1).unwrap_or(0);
        if next_seqno >= self.capacity {
            return Err(Error::OutOfSpace(self.name.clone()));
        }
        let seqno = self.woof.append(&self.name, Bytes::from(shard.encode())).await?;
        Ok(LogRef {
            log_id: self.log_id,
            seqno,
        })
    }
}

/// Reads one shard given its ref, without needing a `StorageLog` handle to
/// its (possibly long-since-rolled-past) log.
async fn read_shard(woof: &Arc<dyn Woof>, r: LogRef) -> Result<Shard, Error> {
    match woof.get(&r.log_name(), r.seqno).await? {
        Some(bytes) => Shard::decode(&bytes).ok_or_else(|| Error::CorruptChain {
            log_id: r.log_id,
            seqno: r.seqno,
            reason: "undecodable shard record".to_string(),
        }),
        None => Err(Error::ShardEvicted {
            log_id: r.log_id,
            seqno: r.seqno,
        }),
    }
}

/// Owns the log blobs are currently being written into; rolls to a fresh
/// one, retrying once, the instant the current one fills (spec §4.4).
pub struct LogWriter {
    woof: Arc<dyn Woof>,
    capacity: u64,
    current: Mutex<StorageLog>,
}

impl LogWriter {
    pub async fn create(woof: Arc<dyn Woof>, capacity: u64) -> Result<Self, Error> {
        let log_id = Self::fresh_log_id(&woof).await?;
        let current = StorageLog::create(woof.clone(), log_id, capacity).await?;
        Ok(Self {
            woof,
            capacity,
            current: Mutex::new(current),
        })
    }

    /// The id of the log currently being written into, for callers (tests,
    /// diagnostics) that want to observe a roll having happened.
    pub async fn current_log_id(&self) -> u64 {
        self.current.lock().await.log_id()
    }

    pub async fn append(&self, shard: &Shard) -> Result<LogRef, Error> {
        let mut guard = self.current.lock().await;
        match guard.append(shard).await {
            Ok(r) => Ok(r),
            Err(Error::OutOfSpace(_)) => {
                let log_id = Self::fresh_log_id(&self.woof).await?;
                let rolled = StorageLog::create(self.woof.clone(), log_id, self.capacity).await?;
                *guard = rolled;
                // Guaranteed to succeed: the new log is empty.
                guard.append(shard).await
            }
            Err(e) => Err(e),
        }
    }

    /// Picks a random 64-bit id whose log file does not already exist.
    /// Collisions are astronomically unlikely over a 64-bit space; the loop
    /// exists purely so a collision is handled rather than assumed away.
    async fn fresh_log_id(woof: &Arc<dyn Woof>) -> Result<u64, Error> {
        loop {
            let candidate: u64 = rand::thread_rng().gen();
            let name = LogRef {
                log_id: candidate,
                seqno: 0,
            }
            .log_name();
            if woof.latest_seqno(&name).await.is_err() {
                return Ok(candidate);
            }
        }
    }
}

/// Writes `data` as a chain of shards, tail-first so every shard can record
/// the ref of the one after it, and returns the ref of the head shard
/// (spec §4.4).
pub async fn write_buffer(writer: &LogWriter, data: &[u8]) -> Result<LogRef, Error> {
    let chunks: Vec<&[u8]> = if data.is_empty() {
        vec![&[][..]]
    } else {
        data.chunks(SHARD_BYTES).collect()
    };

    let mut next: Option<LogRef> = None;
    let mut head = None;
    for idx in (0..chunks.len()).rev() {
        let data_remaining: u64 = chunks[idx..].iter().map(|c| c.len() as u64).sum();
        let shard = Shard {
            next,
            data_remaining,
            bytes: chunks[idx].to_vec(),
        };
        let r = writer.append(&shard).await?;
        next = Some(r);
        head = Some(r);
    }
    Ok(head.expect("chunks is never empty: an empty blob still yields one shard"))
}

/// Follows a shard chain from `start` to its end and returns the
/// concatenated payload (spec §4.4).
pub async fn read_buffer(woof: &Arc<dyn Woof>, start: LogRef) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut cursor = Some(start);
    while let Some(r) = cursor {
        let shard = read_shard(woof, r).await?;
        out.extend_from_slice(&shard.bytes);
        cursor = shard.next;
    }
    Ok(out)
}
