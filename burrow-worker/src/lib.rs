//! Shared bounded queue/pool, worker pool dispatch table, and the IPC
//! framing used to talk to a per-function isolated-env process (spec §4.2,
//! §4.3).
//!
//! The original design shares all of this through memory mapped across a
//! `fork()`ed process boundary. Per the redesign notes (spec §9), this crate
//! keeps the *shape* — a bounded queue feeding a fixed-size pool of worker
//! fibres, backpressure via a bounded object pool, a tagged job sum type
//! instead of an integer command table — but carries it over a Unix domain
//! socket with a small framed protocol rather than shared memory, since the
//! isolated-env process is a real, separate OS process.

pub mod dispatcher;
pub mod error;
pub mod host;
pub mod ipc;
pub mod pool;
pub mod queue;

pub use error::Error;
pub use ipc::{JobRequest, JobResponse};

pub type Result<T> = std::result::Result<T, Error>;
