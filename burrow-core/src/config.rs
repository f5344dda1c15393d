use std::path::PathBuf;

use clap::Args;

/// Tuning constants from spec §6.7. Kept as `const` defaults and as fields on
/// [`Config`] so tests can override them with smaller values.
pub mod defaults {
    pub const WORKER_QUEUE_DEPTH: usize = 16;
    pub const OBJECT_POOL_SIZE: usize = 2 * WORKER_QUEUE_DEPTH;
    pub const RESULT_WOOF_COUNT: usize = 4;
    pub const CALL_WOOF_EL_SIZE: usize = 16 * 1024;
    pub const RESULT_WOOF_EL_SIZE: usize = CALL_WOOF_EL_SIZE;
    pub const SHARD_BYTES: usize = 16 * 1024;
    pub const SHARDS_PER_LOG: u64 = 1024;
    pub const BUCKET_INDEX_CAPACITY: u64 = 128 * 1024;
    pub const INVOCATION_TIMEOUT_MS: u64 = 30_000;
    pub const POLL_BACKOFF_INITIAL_MS: u64 = 4;
    pub const POLL_BACKOFF_CAP_MS: u64 = 512;
}

/// Directory & tuning configuration shared by the function manager and the
/// object store. Constructed from CLI flags in the two HTTP binaries
/// (`clap(flatten)`, mirroring how the workspace's other server binaries
/// compose their `Cli` structs), or directly in tests with a `tempfile`
/// root.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Root directory for function metadata JSON files.
    #[arg(long, env = "BURROW_METADATA_DIR")]
    pub metadata_dir: PathBuf,

    /// Root directory for uploaded function code bundles, keyed by sha256.
    #[arg(long, env = "BURROW_ZIPS_DIR")]
    pub zips_dir: PathBuf,

    /// Root directory under which per-function installations are materialised.
    #[arg(long, env = "BURROW_INSTALL_BASE")]
    pub install_base: PathBuf,

    /// Root directory for bucket indexes, notification configs and blob shards.
    #[arg(long, env = "BURROW_OBJECT_BASE")]
    pub object_base: PathBuf,

    /// Base URL of the function control plane, used by the notification
    /// engine to dispatch event invocations.
    #[arg(
        long,
        env = "BURROW_FUNCTION_SERVICE_URL",
        default_value = "http://127.0.0.1:80"
    )]
    pub function_service_url: String,

    #[arg(long, env = "BURROW_WORKER_QUEUE_DEPTH", default_value_t = defaults::WORKER_QUEUE_DEPTH)]
    pub worker_queue_depth: usize,

    #[arg(long, env = "BURROW_RESULT_WOOF_COUNT", default_value_t = defaults::RESULT_WOOF_COUNT)]
    pub result_woof_count: usize,

    #[arg(long, env = "BURROW_CALL_WOOF_EL_SIZE", default_value_t = defaults::CALL_WOOF_EL_SIZE)]
    pub call_woof_el_size: usize,

    #[arg(long, env = "BURROW_SHARD_BYTES", default_value_t = defaults::SHARD_BYTES)]
    pub shard_bytes: usize,

    #[arg(long, env = "BURROW_SHARDS_PER_LOG", default_value_t = defaults::SHARDS_PER_LOG)]
    pub shards_per_log: u64,

    #[arg(long, env = "BURROW_BUCKET_INDEX_CAPACITY", default_value_t = defaults::BUCKET_INDEX_CAPACITY)]
    pub bucket_index_capacity: u64,

    #[arg(long, env = "BURROW_INVOCATION_TIMEOUT_MS", default_value_t = defaults::INVOCATION_TIMEOUT_MS)]
    pub invocation_timeout_ms: u64,
}

impl Config {
    /// A `Config` rooted at a scratch directory, for tests. Keeps the
    /// tuning knobs at their real defaults unless the caller overrides them
    /// afterwards.
    pub fn for_tests(root: &std::path::Path) -> Self {
        Self {
            metadata_dir: root.join("metadata"),
            zips_dir: root.join("zips"),
            install_base: root.join("installs"),
            object_base: root.join("objects"),
            function_service_url: "http://127.0.0.1:0".to_string(),
            worker_queue_depth: defaults::WORKER_QUEUE_DEPTH,
            result_woof_count: defaults::RESULT_WOOF_COUNT,
            call_woof_el_size: defaults::CALL_WOOF_EL_SIZE,
            shard_bytes: defaults::SHARD_BYTES,
            shards_per_log: defaults::SHARDS_PER_LOG,
            bucket_index_capacity: defaults::BUCKET_INDEX_CAPACITY,
            invocation_timeout_ms: defaults::INVOCATION_TIMEOUT_MS,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.metadata_dir)?;
        std::fs::create_dir_all(&self.zips_dir)?;
        std::fs::create_dir_all(&self.install_base)?;
        std::fs::create_dir_all(&self.object_base)?;
        Ok(())
    }
}
