//! Sharded blob filesystem and bucket index over log-woof (spec §4.4, §4.5).

mod error;
mod index;
mod logwriter;
mod shard;
mod store;

pub use error::Error;
pub use index::{BucketIndex, BucketIndexEntry, DEFAULT_INDEX_CAPACITY, MAX_KEY_LEN};
pub use logwriter::{read_buffer, write_buffer, LogWriter, StorageLog};
pub use shard::{LogRef, Shard, SHARDS_PER_LOG, SHARD_BYTES, SHARD_RECORD_SIZE};
pub use store::BlobStore;

pub type Result<T> = std::result::Result<T, Error>;
