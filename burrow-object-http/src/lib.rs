//! HTTP façade for the S3-compatible object service (spec §6.2): a thin
//! axum router composing `burrow_blobstore::BlobStore` (PUT/GET of object
//! bytes) with `burrow_notify::NotificationEngine` (the notification
//! configuration sub-resource and event dispatch on mutation).

mod handlers;

use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use burrow_blobstore::BlobStore;
use burrow_notify::NotificationEngine;

#[derive(Clone)]
pub struct AppState {
    pub blob_store: Arc<BlobStore>,
    pub notify: Arc<NotificationEngine>,
}

impl AppState {
    pub fn new(blob_store: Arc<BlobStore>, notify: Arc<NotificationEngine>) -> Self {
        Self { blob_store, notify }
    }
}

/// Builds the router without attaching state (see `burrow_lambda_http`'s
/// `gen_router` for why `with_state` is left to the caller).
pub fn gen_router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/:bucket", put(handlers::put_bucket))
        .route("/:bucket/*key", put(handlers::put_object).get(handlers::get_object))
}
