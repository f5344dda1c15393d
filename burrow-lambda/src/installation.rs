//! Function installation lifecycle (spec §4.7): materialising an isolated
//! execution environment on disk, spawning its worker-host process, and
//! routing invocations to it.
//!
//! The embedded-interpreter shim and its companion binaries (container
//! shim, language-runtime shim) are explicitly out of scope (spec §1); this
//! redesign's `burrow-worker::Dispatcher` trait stands in for all three, so
//! installation here only spawns the one `burrow-worker-host` process and
//! never copies sidecar binaries into the install directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use burrow_woof::{FileWoofStore, Woof};
use burrow_worker::ipc::{self, JobRequest, JobResponse};
use bytes::Bytes;
use serde_json::Value;
use tokio::net::UnixStream;
use tokio::process::Child;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::lease::{LeasePool, ResultLogLease};
use crate::Error;

const LAMBDA_WOOF: &str = "lambda.woof";

pub enum InvokeOutcome {
    Result(Vec<u8>),
    TimedOut,
    /// Fire-and-forget invocation; the caller never observes a body.
    Fired,
}

/// A materialised, running environment for one function (spec §3's
/// "Installation").
pub struct FunctionInstallation {
    install_path: PathBuf,
    socket_path: PathBuf,
    child: tokio::sync::Mutex<Child>,
    woof: Arc<dyn Woof>,
    leases: LeasePool,
}

impl FunctionInstallation {
    /// Runs the full install sequence: fresh directory, unzip, spawn the
    /// worker host, pre-create result logs and the invocation log.
    #[instrument(skip(zip_bytes), fields(function = %function_name))]
    pub async fn create(
        function_name: &str,
        install_path: PathBuf,
        zip_bytes: &[u8],
        worker_host_bin: &Path,
        worker_pool_depth: usize,
        result_woof_count: usize,
        call_woof_el_size: usize,
    ) -> Result<Self, Error> {
        if install_path.exists() {
            tokio::fs::remove_dir_all(&install_path).await?;
        }
        tokio::fs::create_dir_all(&install_path).await?;

        let zip_path = install_path.join("__source.zip");
        tokio::fs::write(&zip_path, zip_bytes).await?;
        unzip(&zip_path, &install_path).await?;

        let socket_path = install_path.join("worker.sock");
        let child = tokio::process::Command::new(worker_host_bin)
            .arg(&install_path)
            .arg(&socket_path)
            .env("BURROW_WORKER_POOL_DEPTH", worker_pool_depth.to_string())
            .kill_on_drop(true)
            .spawn()?;

        // Known race (spec §9): the host needs a moment to bind its
        // socket before the manager's first connection.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let woof: Arc<dyn Woof> = Arc::new(FileWoofStore::open(&install_path)?);
        let leases = LeasePool::create(&woof, result_woof_count, call_woof_el_size as u32).await?;
        woof.create(LAMBDA_WOOF, call_woof_el_size as u32, 1024).await?;

        info!(install_path = %install_path.display(), "function installed");
        Ok(Self {
            install_path,
            socket_path,
            child: tokio::sync::Mutex::new(child),
            woof,
            leases,
        })
    }

    /// Invocation (spec §4.7). `request_response = false` skips lease
    /// acquisition and the result wait entirely, matching the "Event"
    /// invocation type. Takes `&self`: every field it touches is already
    /// internally synchronized, so independent invocations (spec §5) and
    /// even concurrent invocations of the same function proceed without
    /// serializing on a manager-wide lock.
    pub async fn invoke(
        &self,
        function_name: &str,
        metadata: &Value,
        payload: &[u8],
        call_woof_el_size: usize,
        request_response: bool,
        timeout: Duration,
    ) -> Result<InvokeOutcome, Error> {
        if !request_response {
            let composed = compose_payload(function_name, None, metadata, payload, call_woof_el_size)?;
            self.woof.append(LAMBDA_WOOF, Bytes::from(composed)).await?;
            let invocation_id = Uuid::new_v4().to_string();
            // Fire-and-forget: do not wait for (or even require) a response.
            let _ = self.send_invoke(invocation_id, function_name.to_string(), payload.to_vec()).await;
            return Ok(InvokeOutcome::Fired);
        }

        let mut lease = self.leases.acquire().await?;

        // Every path below — success, composition error, append error,
        // dispatch error, or timeout — must release `lease` exactly once
        // before returning (spec §7: leases released on every path).
        let outcome = self.invoke_request_response(function_name, metadata, payload, call_woof_el_size, timeout, &mut lease).await;
        self.leases.release(lease).await?;
        outcome
    }

    async fn invoke_request_response(
        &self,
        function_name: &str,
        metadata: &Value,
        payload: &[u8],
        call_woof_el_size: usize,
        timeout: Duration,
        lease: &mut ResultLogLease,
    ) -> Result<InvokeOutcome, Error> {
        // Always take the seqno the worker process has actually observed,
        // not a cached value, since concurrent invocations may have
        // advanced it (spec §4.7 step 2).
        lease.last_observed_seqno = self.woof.latest_seqno(&lease.woof_name()).await?;

        let composed = compose_payload(function_name, Some(&lease.woof_name()), metadata, payload, call_woof_el_size)?;
        self.woof.append(LAMBDA_WOOF, Bytes::from(composed)).await?;

        let invocation_id = Uuid::new_v4().to_string();
        let dispatch = self.send_invoke(invocation_id, function_name.to_string(), payload.to_vec());

        match tokio::time::timeout(timeout, dispatch).await {
            Ok(Ok(result_bytes)) => {
                self.woof.append(&lease.woof_name(), Bytes::from(result_bytes.clone())).await?;
                lease.last_observed_seqno = self.woof.latest_seqno(&lease.woof_name()).await?;
                Ok(InvokeOutcome::Result(result_bytes))
            }
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => {
                // Open question resolved per spec §9: always refresh to
                // max(cached, latest) rather than keep the stale value, in
                // case the handler posted a late result.
                let latest = self.woof.latest_seqno(&lease.woof_name()).await?;
                lease.last_observed_seqno = match (lease.last_observed_seqno, latest) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
                Ok(InvokeOutcome::TimedOut)
            }
        }
    }

    async fn send_invoke(&self, invocation_id: String, handler_name: String, payload: Vec<u8>) -> Result<Vec<u8>, Error> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (read_half, write_half) = stream.into_split();
        ipc::write_request(
            write_half,
            &JobRequest::Invoke {
                invocation_id: invocation_id.clone(),
                handler_name,
                payload,
            },
        )
        .await?;
        match ipc::read_response(read_half).await? {
            Some(JobResponse::Invoked { result, .. }) => {
                result.map_err(|msg| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, msg)))
            }
            Some(other) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unexpected worker response {other:?}"),
            ))),
            None => Err(Error::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "worker host closed the connection"))),
        }
    }

    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    /// Terminates the worker host and removes the install directory.
    /// Called on `updateCode`, `delete`, and on a failed install's cascade
    /// cleanup (spec §7 propagation policy). Takes `&self` (not ownership)
    /// so a teardown can run while other `Arc<FunctionInstallation>` clones
    /// are still held by in-flight invocations; per spec §5 those are
    /// abandoned on a best-effort basis rather than blocked on.
    pub async fn teardown(&self) -> Result<(), Error> {
        let _ = self.child.lock().await.kill().await;
        tokio::fs::remove_dir_all(&self.install_path).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(e)
            }
        })?;
        Ok(())
    }
}

fn compose_payload(
    function_name: &str,
    result_woof: Option<&str>,
    metadata: &Value,
    payload: &[u8],
    call_woof_el_size: usize,
) -> Result<Vec<u8>, Error> {
    let meta_json = serde_json::json!({
        "function": function_name,
        "result_woof": result_woof,
        "metadata": metadata,
    });
    let mut composed = serde_json::to_vec(&meta_json)?;
    composed.push(0);
    composed.extend_from_slice(payload);
    composed.push(0);

    let limit = call_woof_el_size.saturating_sub(2);
    if composed.len() > limit {
        return Err(Error::RequestTooLarge {
            actual: composed.len(),
            limit,
        });
    }
    Ok(composed)
}

async fn unzip(zip_path: &Path, dest: &Path) -> Result<(), Error> {
    let output = tokio::process::Command::new("unzip")
        .arg("-oq")
        .arg(zip_path)
        .arg("-d")
        .arg(dest)
        .output()
        .await?;
    if !output.status.success() {
        warn!(status = ?output.status, "unzip failed");
        return Err(Error::Unzip(String::from_utf8_lossy(&output.stderr).into_owned()));
    }
    Ok(())
}
