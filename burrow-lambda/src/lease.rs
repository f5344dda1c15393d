//! Result-log lease pool (spec §3, §4.7): a fixed set of pre-created result
//! logs, each an exclusive capability for one invocation round-trip.
//! Reuses the bounded queue from `burrow-worker` — the "shared queue" the
//! spec describes leases being drawn from is exactly that abstraction.

use std::sync::Arc;

use burrow_woof::Woof;
use burrow_worker::queue;
use tokio::sync::Mutex;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLogLease {
    pub index: usize,
    pub last_observed_seqno: Option<u64>,
}

impl ResultLogLease {
    pub fn woof_name(&self) -> String {
        format!("result-{}.woof", self.index)
    }
}

/// Fixed-size pool of `RESULT_WOOF_COUNT` leases (spec §3's invariant: the
/// set is fixed size, and any invocation that acquires one must return it
/// on every path).
pub struct LeasePool {
    tx: queue::Sender<ResultLogLease>,
    rx: Mutex<queue::Receiver<ResultLogLease>>,
}

impl LeasePool {
    /// Pre-creates `count` result logs, each of capacity 1 and record size
    /// `el_size`, and fills the lease queue with one lease per log.
    pub async fn create(woof: &Arc<dyn Woof>, count: usize, el_size: u32) -> Result<Self, Error> {
        let (tx, rx) = queue::bounded(count);
        for index in 0..count {
            let lease = ResultLogLease {
                index,
                last_observed_seqno: None,
            };
            woof.create(&lease.woof_name(), el_size, 1).await?;
            tx.put(lease).await?;
        }
        Ok(Self {
            tx,
            rx: Mutex::new(rx),
        })
    }

    /// Blocks until a lease is available.
    pub async fn acquire(&self) -> Result<ResultLogLease, Error> {
        self.rx
            .lock()
            .await
            .get()
            .await
            .ok_or_else(|| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "lease pool closed")))
    }

    /// Returns a lease to the pool. Must be called on every invocation
    /// path — success, timeout, or error (spec §7 propagation policy).
    pub async fn release(&self, lease: ResultLogLease) -> Result<(), Error> {
        self.tx.put(lease).await.map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_woof::FileWoofStore;

    #[tokio::test]
    async fn acquire_then_release_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let woof: Arc<dyn Woof> = Arc::new(FileWoofStore::open(dir.path()).unwrap());
        let pool = LeasePool::create(&woof, 2, 64).await.unwrap();

        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_ne!(a.index, b.index);

        pool.release(a).await.unwrap();
        let c = pool.acquire().await.unwrap();
        assert_eq!(c.index, a.index);
        pool.release(b).await.unwrap();
        pool.release(c).await.unwrap();
    }

    #[tokio::test]
    async fn acquire_blocks_when_every_lease_is_out() {
        let dir = tempfile::tempdir().unwrap();
        let woof: Arc<dyn Woof> = Arc::new(FileWoofStore::open(dir.path()).unwrap());
        let pool = Arc::new(LeasePool::create(&woof, 1, 64).await.unwrap());
        let only = pool.acquire().await.unwrap();

        let waiter_pool = pool.clone();
        let waiter = tokio::spawn(async move { waiter_pool.acquire().await.unwrap() });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        pool.release(only).await.unwrap();
        let got = waiter.await.unwrap();
        assert_eq!(got.index, 0);
    }

    // Spec §8 invariant 4: concurrent invocations targeting the same function
    // observe distinct leases while both are outstanding.
    #[tokio::test]
    async fn concurrently_held_leases_never_alias() {
        let dir = tempfile::tempdir().unwrap();
        let woof: Arc<dyn Woof> = Arc::new(FileWoofStore::open(dir.path()).unwrap());
        let pool = Arc::new(LeasePool::create(&woof, 4, 64).await.unwrap());

        let mut held = Vec::new();
        for _ in 0..4 {
            held.push(pool.acquire().await.unwrap());
        }
        let mut indices: Vec<usize> = held.iter().map(|l| l.index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 4, "all four outstanding leases must have distinct indices");

        for lease in held {
            pool.release(lease).await.unwrap();
        }
    }

    // Spec §8 invariant 5: every acquired lease is eventually released, across
    // many overlapping concurrent invocation-shaped acquire/release cycles.
    #[tokio::test]
    async fn every_acquired_lease_is_released_under_concurrent_load() {
        let dir = tempfile::tempdir().unwrap();
        let woof: Arc<dyn Woof> = Arc::new(FileWoofStore::open(dir.path()).unwrap());
        let pool = Arc::new(LeasePool::create(&woof, 3, 64).await.unwrap());

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let pool = pool.clone();
            tasks.push(tokio::spawn(async move {
                let lease = pool.acquire().await.unwrap();
                tokio::task::yield_now().await;
                pool.release(lease).await.unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        // Every lease must still be acquirable afterwards: none were leaked.
        let mut drained = Vec::new();
        for _ in 0..3 {
            drained.push(pool.acquire().await.unwrap());
        }
        let mut indices: Vec<usize> = drained.iter().map(|l| l.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
