//! Request handlers for the object-service HTTP surface (spec §6.2).

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use burrow_core::ErrorKind;
use burrow_notify::ObjectEvent;
use tracing::instrument;

use crate::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

/// True iff the request's query string carries a bare `notification` flag
/// (`?notification` or `?notification=`), the sub-resource marker the real
/// S3 API uses to distinguish "set this bucket's notification config" from
/// a plain bucket PUT (spec §6.2).
fn is_notification_request(uri: &Uri) -> bool {
    uri.query()
        .map(|q| q.split('&').any(|kv| kv == "notification" || kv.starts_with("notification=")))
        .unwrap_or(false)
}

/// `PUT /:bucket[?notification]` (spec §6.2). Buckets auto-exist, so a
/// plain `PUT /:bucket` is a no-op; `?notification` instead replaces the
/// bucket's notification configuration with the XML request body.
#[instrument(skip(state, body), fields(bucket = %bucket))]
pub async fn put_bucket(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    uri: Uri,
    body: Bytes,
) -> Result<Response, ErrorKind> {
    if is_notification_request(&uri) {
        let xml = std::str::from_utf8(&body)
            .map_err(|e| ErrorKind::InvalidParameter(format!("notification config is not valid utf-8: {e}")))?;
        state.notify.put_config(&bucket, xml).await.map_err(ErrorKind::from)?;
    }
    Ok(StatusCode::OK.into_response())
}

#[instrument(skip(state, body), fields(bucket = %bucket, key = %key, len = body.len()))]
pub async fn put_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ErrorKind> {
    state.blob_store.put(&bucket, &key, &body).await.map_err(ErrorKind::from)?;
    state.notify.notify(ObjectEvent::put(bucket, key, body.len() as u64)).await;
    Ok(StatusCode::OK.into_response())
}

#[instrument(skip(state), fields(bucket = %bucket, key = %key))]
pub async fn get_object(State(state): State<AppState>, Path((bucket, key)): Path<(String, String)>) -> Result<Response, ErrorKind> {
    match state.blob_store.get(&bucket, &key).await.map_err(ErrorKind::from)? {
        Some(bytes) => Ok((StatusCode::OK, bytes).into_response()),
        None => Ok((StatusCode::NOT_FOUND, "Not Found").into_response()),
    }
}
