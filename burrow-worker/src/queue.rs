//! The shared bounded FIFO of spec §4.2. `put` blocks while full, `get`
//! blocks while empty, both atomic with respect to other producers/
//! consumers — exactly the contract `tokio::sync::mpsc`'s bounded channel
//! provides in-process. We wrap it rather than using it bare so the rest of
//! the crate names the operation the spec names (`put`/`get`) and so a
//! future swap to a cross-process transport only touches this module.

use tokio::sync::mpsc;

use crate::Error;

pub struct Sender<T>(mpsc::Sender<T>);
pub struct Receiver<T>(mpsc::Receiver<T>);

/// A bounded FIFO of capacity `depth`. Cloning the sender is cheap and
/// expected — many producers, one logical consumer loop.
pub fn bounded<T>(depth: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = mpsc::channel(depth);
    (Sender(tx), Receiver(rx))
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Sender(self.0.clone())
    }
}

impl<T> Sender<T> {
    /// Blocks (asynchronously) while the queue is full.
    pub async fn put(&self, item: T) -> Result<(), Error> {
        self.0.send(item).await.map_err(|_| Error::QueueClosed)
    }
}

impl<T> Receiver<T> {
    /// Blocks (asynchronously) while the queue is empty. Returns `None` once
    /// every sender has been dropped.
    pub async fn get(&mut self) -> Option<T> {
        self.0.recv().await
    }
}
