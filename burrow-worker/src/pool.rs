//! The fixed-capacity object pool of spec §4.2: `acquire` blocks while every
//! chunk is in use, `release` returns one. Used on the manager side to bound
//! the number of concurrently in-flight invocation payload buffers, so a
//! burst of invocations applies backpressure instead of growing memory
//! without bound.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A chunk on loan from the pool. Dropping it returns the chunk's capacity
/// to the pool automatically; there is no explicit `release` call to forget,
/// unlike the source's raw acquire/release pair (double-release there is a
/// programming error — here it's unrepresentable).
pub struct Chunk {
    pub buf: Vec<u8>,
    _permit: OwnedSemaphorePermit,
}

impl std::ops::Deref for Chunk {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl std::ops::DerefMut for Chunk {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

/// `count` fixed-capacity buffers of `chunk_size` bytes each.
pub struct ObjectPool {
    semaphore: Arc<Semaphore>,
    chunk_size: usize,
}

impl ObjectPool {
    pub fn new(count: usize, chunk_size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(count)),
            chunk_size,
        }
    }

    /// Blocks while all chunks are in use.
    pub async fn acquire(&self) -> Chunk {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("pool semaphore never closed");
        Chunk {
            buf: Vec::with_capacity(self.chunk_size),
            _permit: permit,
        }
    }
}
