//! Wire protocol between the function manager (client) and a per-function
//! `burrow-worker-host` process (server), carried over a Unix domain socket.
//!
//! The source passes a fixed-layout command struct through shared memory and
//! a semaphore pair to signal "request ready" / "response ready". Since each
//! side here is a genuine separate process rather than two threads sharing an
//! address space, we frame a serde_json payload with a 4-byte length prefix
//! instead — `tokio_util::codec::LengthDelimitedCodec` gives us the framing,
//! `JobRequest`/`JobResponse` give us the typed payload the old command-id
//! integer used to select.

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::Error;

/// A unit of work handed to the isolated-env process. One variant per
/// trigger kind the worker host understands; there is exactly one kind
/// today (invoke), but the enum leaves room for the source's health-check
/// and teardown commands without disturbing callers matching on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobRequest {
    /// Invoke the installed handler with `payload`, tagged with an
    /// `invocation_id` so the response can be correlated by the caller even
    /// though each request gets its own connection.
    Invoke {
        invocation_id: String,
        handler_name: String,
        payload: Vec<u8>,
    },
    /// Liveness probe; the host replies with `Pong` as soon as it can accept
    /// work, used by the function manager right after spawning the process.
    Ping,
    /// Ask the host to exit after finishing any in-flight job.
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobResponse {
    Invoked {
        invocation_id: String,
        result: Result<Vec<u8>, String>,
    },
    Pong,
    ShuttingDown,
}

/// Serializes `req` and writes one length-delimited frame to `writer`.
pub async fn write_request<W: AsyncWrite + Unpin>(writer: W, req: &JobRequest) -> Result<(), Error> {
    let mut framed = FramedWrite::new(writer, LengthDelimitedCodec::new());
    let bytes = serde_json::to_vec(req)?;
    use futures::SinkExt;
    framed.send(Bytes::from(bytes)).await?;
    Ok(())
}

/// Reads exactly one length-delimited frame from `reader` and deserializes
/// it as a `JobResponse`. Returns `Ok(None)` if the peer closed the
/// connection before sending a frame.
pub async fn read_response<R: AsyncRead + Unpin>(reader: R) -> Result<Option<JobResponse>, Error> {
    let mut framed = FramedRead::new(reader, LengthDelimitedCodec::new());
    use futures::StreamExt;
    match framed.next().await {
        Some(frame) => Ok(Some(serde_json::from_slice(&frame?)?)),
        None => Ok(None),
    }
}

/// Server-side counterpart of [`write_request`]/[`read_response`]: reads one
/// request frame, or `None` on a clean disconnect.
pub async fn read_request<R: AsyncRead + Unpin>(reader: R) -> Result<Option<JobRequest>, Error> {
    let mut framed = FramedRead::new(reader, LengthDelimitedCodec::new());
    use futures::StreamExt;
    match framed.next().await {
        Some(frame) => Ok(Some(serde_json::from_slice(&frame?)?)),
        None => Ok(None),
    }
}

pub async fn write_response<W: AsyncWrite + Unpin>(writer: W, resp: &JobResponse) -> Result<(), Error> {
    let mut framed = FramedWrite::new(writer, LengthDelimitedCodec::new());
    let bytes = serde_json::to_vec(resp)?;
    use futures::SinkExt;
    framed.send(Bytes::from(bytes)).await?;
    Ok(())
}

/// Round-trips `bytes` through the length-delimited codec directly, without
/// a socket — used by tests that only want to check (de)serialization.
#[cfg(test)]
pub(crate) fn encode_for_test(req: &JobRequest) -> BytesMut {
    let mut buf = BytesMut::new();
    let payload = serde_json::to_vec(req).unwrap();
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    buf
}
