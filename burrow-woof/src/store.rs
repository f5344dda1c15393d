use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::{Error, Result};

const MAGIC: &[u8; 4] = b"WOOF";
const HEADER_LEN: u64 = 32;

#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// The log-woof contract consumed by every higher layer (spec §4.1).
#[async_trait]
pub trait Woof: Send + Sync {
    async fn create(&self, name: &str, record_size: u32, capacity: u64) -> Result<CreateOutcome>;
    async fn append(&self, name: &str, payload: Bytes) -> Result<u64>;
    async fn get(&self, name: &str, seqno: u64) -> Result<Option<Bytes>>;
    async fn latest_seqno(&self, name: &str) -> Result<Option<u64>>;
}

/// A single named log, backed by one file: a 32-byte header followed by
/// `capacity` fixed-size slots of `8 (seqno) + 4 (len) + record_size` bytes
/// each, indexed circularly by `seqno % capacity`.
struct LogHandle {
    file: File,
    record_size: u32,
    capacity: u64,
    next_seqno: u64,
}

impl LogHandle {
    fn slot_size(record_size: u32) -> u64 {
        8 + 4 + record_size as u64
    }

    fn slot_offset(record_size: u32, index: u64) -> u64 {
        HEADER_LEN + index * Self::slot_size(record_size)
    }

    fn create(path: &Path, record_size: u32, capacity: u64) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        let total_len = HEADER_LEN + capacity * Self::slot_size(record_size);
        file.set_len(total_len)?;
        let mut handle = LogHandle {
            file,
            record_size,
            capacity,
            next_seqno: 0,
        };
        handle.write_header()?;
        Ok(handle)
    }

    fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut header = [0u8; HEADER_LEN as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;
        if &header[0..4] != MAGIC {
            return Err(Error::Corrupt(
                path.display().to_string(),
                "bad magic".to_string(),
            ));
        }
        let record_size = u32::from_le_bytes(header[4..8].try_into().unwrap());
        let capacity = u64::from_le_bytes(header[8..16].try_into().unwrap());
        let next_seqno = u64::from_le_bytes(header[16..24].try_into().unwrap());
        Ok(LogHandle {
            file,
            record_size,
            capacity,
            next_seqno,
        })
    }

    fn write_header(&mut self) -> Result<()> {
        let mut header = [0u8; HEADER_LEN as usize];
        header[0..4].copy_from_slice(MAGIC);
        header[4..8].copy_from_slice(&self.record_size.to_le_bytes());
        header[8..16].copy_from_slice(&self.capacity.to_le_bytes());
        header[16..24].copy_from_slice(&self.next_seqno.to_le_bytes());
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header)?;
        self.file.flush()?;
        Ok(())
    }

    fn append(&mut self, payload: &[u8]) -> Result<u64> {
        if payload.len() > self.record_size as usize {
            return Err(Error::PayloadTooLarge {
                name: String::new(),
                len: payload.len(),
                record_size: self.record_size as usize,
            });
        }
        let seqno = self.next_seqno;
        let index = seqno % self.capacity;
        let offset = Self::slot_offset(self.record_size, index);

        let mut slot = vec![0u8; Self::slot_size(self.record_size) as usize];
        slot[0..8].copy_from_slice(&seqno.to_le_bytes());
        slot[8..12].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        slot[12..12 + payload.len()].copy_from_slice(payload);

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&slot)?;

        self.next_seqno += 1;
        self.write_header()?;
        Ok(seqno)
    }

    fn get(&mut self, seqno: u64) -> Result<Option<Bytes>> {
        if seqno >= self.next_seqno {
            return Ok(None);
        }
        if self.next_seqno - seqno > self.capacity {
            // evicted by wraparound
            return Ok(None);
        }
        let index = seqno % self.capacity;
        let offset = Self::slot_offset(self.record_size, index);
        let mut slot = vec![0u8; Self::slot_size(self.record_size) as usize];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut slot)?;

        let stored_seqno = u64::from_le_bytes(slot[0..8].try_into().unwrap());
        if stored_seqno != seqno {
            // Slot has since been overwritten by a newer append; treat as evicted.
            return Ok(None);
        }
        let len = u32::from_le_bytes(slot[8..12].try_into().unwrap()) as usize;
        Ok(Some(Bytes::copy_from_slice(&slot[12..12 + len])))
    }

    fn latest_seqno(&self) -> Option<u64> {
        self.next_seqno.checked_sub(1)
    }
}

/// A directory-scoped collection of named logs. One [`FileWoofStore`] is
/// owned by a single process (the object-store HTTP service, or the
/// isolated-env worker host) — there is no cross-process shared-memory
/// access here, per the redesign in spec §9.
#[derive(Clone)]
pub struct FileWoofStore {
    root: PathBuf,
    handles: Arc<RwLock<HashMap<String, Arc<Mutex<LogHandle>>>>>,
}

impl FileWoofStore {
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            handles: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn handle_for(&self, name: &str) -> Result<Arc<Mutex<LogHandle>>> {
        if let Some(h) = self.handles.read().get(name) {
            return Ok(h.clone());
        }
        let path = self.path_for(name);
        if !path.exists() {
            return Err(Error::NotFound(name.to_string()));
        }
        let handle = Arc::new(Mutex::new(LogHandle::open(&path)?));
        self.handles
            .write()
            .insert(name.to_string(), handle.clone());
        Ok(handle)
    }
}

#[async_trait]
impl Woof for FileWoofStore {
    #[tracing::instrument(skip(self), fields(woof.name = %name), err)]
    async fn create(&self, name: &str, record_size: u32, capacity: u64) -> Result<CreateOutcome> {
        if self.handles.read().contains_key(name) || self.path_for(name).exists() {
            return Ok(CreateOutcome::AlreadyExists);
        }
        let path = self.path_for(name);
        let handle = LogHandle::create(&path, record_size, capacity)?;
        self.handles
            .write()
            .insert(name.to_string(), Arc::new(Mutex::new(handle)));
        Ok(CreateOutcome::Created)
    }

    #[tracing::instrument(skip(self, payload), fields(woof.name = %name, payload.len = payload.len()), err)]
    async fn append(&self, name: &str, payload: Bytes) -> Result<u64> {
        let handle = self.handle_for(name)?;
        let mut guard = handle.lock();
        guard.append(&payload).map_err(|e| match e {
            Error::PayloadTooLarge {
                len, record_size, ..
            } => Error::PayloadTooLarge {
                name: name.to_string(),
                len,
                record_size,
            },
            other => other,
        })
    }

    #[tracing::instrument(skip(self), fields(woof.name = %name, woof.seqno = seqno), err)]
    async fn get(&self, name: &str, seqno: u64) -> Result<Option<Bytes>> {
        let handle = self.handle_for(name)?;
        let mut guard = handle.lock();
        guard.get(seqno)
    }

    #[tracing::instrument(skip(self), fields(woof.name = %name), err)]
    async fn latest_seqno(&self, name: &str) -> Result<Option<u64>> {
        let handle = self.handle_for(name)?;
        let guard = handle.lock();
        Ok(guard.latest_seqno())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, FileWoofStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileWoofStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn create_then_append_then_get() {
        let (_dir, store) = store().await;
        assert_eq!(
            store.create("a.woof", 64, 4).await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            store.create("a.woof", 64, 4).await.unwrap(),
            CreateOutcome::AlreadyExists
        );

        let seq0 = store.append("a.woof", Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(seq0, 0);
        let got = store.get("a.woof", 0).await.unwrap().unwrap();
        assert_eq!(&got[..], b"hello");

        assert_eq!(store.latest_seqno("a.woof").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn wraps_and_evicts_oldest() {
        let (_dir, store) = store().await;
        store.create("b.woof", 8, 2).await.unwrap();
        store.append("b.woof", Bytes::from_static(b"one")).await.unwrap();
        store.append("b.woof", Bytes::from_static(b"two")).await.unwrap();
        // third append wraps over slot 0
        store.append("b.woof", Bytes::from_static(b"three")).await.unwrap();

        assert_eq!(store.get("b.woof", 0).await.unwrap(), None);
        assert_eq!(
            &store.get("b.woof", 2).await.unwrap().unwrap()[..],
            b"three"
        );
        assert_eq!(store.latest_seqno("b.woof").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn get_on_unknown_seqno_returns_none() {
        let (_dir, store) = store().await;
        store.create("c.woof", 8, 4).await.unwrap();
        assert_eq!(store.get("c.woof", 9).await.unwrap(), None);
        assert_eq!(store.latest_seqno("c.woof").await.unwrap(), None);
    }

    #[tokio::test]
    async fn payload_larger_than_record_size_is_rejected() {
        let (_dir, store) = store().await;
        store.create("d.woof", 4, 4).await.unwrap();
        let err = store
            .append("d.woof", Bytes::from_static(b"too long"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn reopening_store_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileWoofStore::open(dir.path()).unwrap();
            store.create("e.woof", 16, 4).await.unwrap();
            store.append("e.woof", Bytes::from_static(b"persisted")).await.unwrap();
        }
        let store = FileWoofStore::open(dir.path()).unwrap();
        assert_eq!(
            &store.get("e.woof", 0).await.unwrap().unwrap()[..],
            b"persisted"
        );
    }
}
