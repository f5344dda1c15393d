//! Entry point for the per-function isolated-env process. The function
//! manager spawns one of these per installed function on first invocation
//! after a cold start, passing the install directory and the Unix socket
//! path to listen on; the process exits on receiving a shutdown request or
//! on signal.
//!
//! No handler runtime is wired in here (spec §1's embedded-interpreter shim
//! is out of scope); this binary always runs with `UnavailableDispatcher`
//! unless `BURROW_WORKER_RUNNER` names an external runner executable, in
//! which case `SubprocessDispatcher` shells out to it per invocation.

use std::path::PathBuf;
use std::sync::Arc;

use burrow_worker::dispatcher::{Dispatcher, SubprocessDispatcher, UnavailableDispatcher};
use burrow_worker::host::WorkerHost;

#[tokio::main]
async fn main() {
    burrow_core::telemetry::init("burrow_worker=info,warn");

    let mut args = std::env::args().skip(1);
    let install_dir = PathBuf::from(args.next().expect("usage: burrow-worker-host <install_dir> <socket_path>"));
    let socket_path = PathBuf::from(args.next().expect("usage: burrow-worker-host <install_dir> <socket_path>"));

    let worker_pool_depth: usize = std::env::var("BURROW_WORKER_POOL_DEPTH")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4);

    let dispatcher: Arc<dyn Dispatcher> = match std::env::var("BURROW_WORKER_RUNNER") {
        Ok(runner_path) => Arc::new(SubprocessDispatcher::new(runner_path, install_dir)),
        Err(_) => Arc::new(UnavailableDispatcher),
    };

    let host = Arc::new(WorkerHost::new(dispatcher, worker_pool_depth));
    if let Err(e) = host.serve(&socket_path).await {
        tracing::error!(error = %e, "worker host exited with error");
        std::process::exit(1);
    }
}
