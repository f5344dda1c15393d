//! The isolated-env side of the worker pool (spec §4.3): one process per
//! installed function, listening on a Unix domain socket at a
//! manager-chosen path, accepting one connection per invocation.
//!
//! Concurrency within the process is bounded by a semaphore sized to the
//! configured worker-pool depth, mirroring the source's fixed-size array of
//! worker fibres pulling off the shared queue — here each accepted
//! connection is a unit of work, and the semaphore permit stands in for a
//! fibre slot.

use std::path::Path;
use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Notify, Semaphore};
use tracing::{info, instrument, warn};

use crate::dispatcher::Dispatcher;
use crate::ipc::{self, JobRequest, JobResponse};
use crate::Error;

pub struct WorkerHost {
    dispatcher: Arc<dyn Dispatcher>,
    concurrency: Arc<Semaphore>,
    shutdown: Arc<Notify>,
}

impl WorkerHost {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, worker_pool_depth: usize) -> Self {
        Self {
            dispatcher,
            concurrency: Arc::new(Semaphore::new(worker_pool_depth.max(1))),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Binds `socket_path` and serves connections until a client sends
    /// `JobRequest::Shutdown`. Removes any stale socket file left behind by
    /// a previous, uncleanly-terminated run before binding.
    #[instrument(skip(self), fields(socket = %socket_path.display()))]
    pub async fn serve(self: Arc<Self>, socket_path: &Path) -> Result<(), Error> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }
        let listener = UnixListener::bind(socket_path)?;
        info!("worker host listening");

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("worker host shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, _addr) = accepted?;
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(e) = this.handle_connection(stream).await {
                            warn!(error = %e, "connection handling failed");
                        }
                    });
                }
            }
        }
    }

    async fn handle_connection(&self, stream: UnixStream) -> Result<(), Error> {
        let (read_half, write_half) = stream.into_split();
        let request = match ipc::read_request(read_half).await? {
            Some(req) => req,
            None => return Ok(()),
        };

        let response = match request {
            JobRequest::Ping => JobResponse::Pong,
            JobRequest::Shutdown => {
                self.shutdown.notify_one();
                JobResponse::ShuttingDown
            }
            JobRequest::Invoke {
                invocation_id,
                handler_name,
                payload,
            } => {
                let _permit = self
                    .concurrency
                    .acquire()
                    .await
                    .expect("host semaphore never closed");
                let result = self
                    .dispatcher
                    .dispatch(&handler_name, &payload)
                    .await
                    .map_err(|e| e.to_string());
                JobResponse::Invoked {
                    invocation_id,
                    result,
                }
            }
        };

        ipc::write_response(write_half, &response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::UnavailableDispatcher;
    use tokio::net::UnixStream;

    #[tokio::test]
    async fn ping_returns_pong() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("worker.sock");
        let host = Arc::new(WorkerHost::new(Arc::new(UnavailableDispatcher), 2));
        let serve_path = socket_path.clone();
        let serve_host = Arc::clone(&host);
        tokio::spawn(async move { serve_host.serve(&serve_path).await.unwrap() });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        ipc::write_request(write_half, &JobRequest::Ping).await.unwrap();
        let resp = ipc::read_response(read_half).await.unwrap().unwrap();
        assert!(matches!(resp, JobResponse::Pong));
    }

    #[tokio::test]
    async fn invoke_with_unavailable_dispatcher_returns_handler_error() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("worker.sock");
        let host = Arc::new(WorkerHost::new(Arc::new(UnavailableDispatcher), 2));
        let serve_path = socket_path.clone();
        let serve_host = Arc::clone(&host);
        tokio::spawn(async move { serve_host.serve(&serve_path).await.unwrap() });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        let req = JobRequest::Invoke {
            invocation_id: "id-1".into(),
            handler_name: "index.handler".into(),
            payload: b"{}".to_vec(),
        };
        ipc::write_request(write_half, &req).await.unwrap();
        let resp = ipc::read_response(read_half).await.unwrap().unwrap();
        match resp {
            JobResponse::Invoked { invocation_id, result } => {
                assert_eq!(invocation_id, "id-1");
                assert!(result.is_err());
            }
            _ => panic!("wrong variant"),
        }
    }

    #[tokio::test]
    async fn shutdown_request_stops_the_serve_loop() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("worker.sock");
        let host = Arc::new(WorkerHost::new(Arc::new(UnavailableDispatcher), 2));
        let serve_path = socket_path.clone();
        let serve_host = Arc::clone(&host);
        let handle = tokio::spawn(async move { serve_host.serve(&serve_path).await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        ipc::write_request(write_half, &JobRequest::Shutdown).await.unwrap();
        let resp = ipc::read_response(read_half).await.unwrap().unwrap();
        assert!(matches!(resp, JobResponse::ShuttingDown));

        tokio::time::timeout(std::time::Duration::from_millis(500), handle)
            .await
            .expect("serve loop should exit after shutdown")
            .unwrap()
            .unwrap();
    }
}
