use burrow_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The current storage log has no room for another shard. Callers
    /// within this crate never observe this directly — `LogWriter` catches
    /// it and rolls to a fresh log — but it's surfaced for completeness and
    /// for tests exercising `StorageLog` in isolation.
    #[error("storage log {0:?} is full")]
    OutOfSpace(String),

    /// A shard chain referenced a log that no longer exists, or a shard
    /// record failed to decode. Both indicate on-disk corruption or a bug,
    /// never a caller mistake.
    #[error("corrupt shard chain at {log_id:016x}/{seqno}: {reason}")]
    CorruptChain {
        log_id: u64,
        seqno: u64,
        reason: String,
    },

    /// A referenced shard was evicted by the bounded log's wraparound
    /// before it could be read.
    #[error("shard at {log_id:016x}/{seqno} has been evicted")]
    ShardEvicted { log_id: u64, seqno: u64 },

    #[error(transparent)]
    Woof(#[from] burrow_woof::Error),
}

impl From<Error> for ErrorKind {
    fn from(e: Error) -> Self {
        let msg = e.to_string();
        match e {
            Error::OutOfSpace(_) => ErrorKind::ServiceError(msg),
            Error::CorruptChain { .. } => ErrorKind::ServiceError(msg),
            Error::ShardEvicted { .. } => ErrorKind::ResourceNotFound(msg),
            Error::Woof(inner) => inner.into(),
        }
    }
}
