//! Notification engine (spec §4.8): per-bucket XML notification
//! configuration, event synthesis, filter evaluation, and fire-and-forget
//! HTTP dispatch to matched target functions.

mod config;
mod dispatch;
mod error;
mod event;
mod filter;
mod store;
mod xml;

pub use config::{Handler, NotificationConfig};
pub use dispatch::Dispatcher;
pub use error::Error;
pub use event::{ObjectEvent, OBJECT_CREATED_COPY, OBJECT_CREATED_POST, OBJECT_CREATED_PUT, OBJECT_REMOVED_DELETE};
pub use filter::Filter;
pub use store::ConfigStore;

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Ties together config storage and dispatch for a whole object service
/// process. One instance is shared by every bucket.
pub struct NotificationEngine {
    store: ConfigStore,
    dispatcher: Dispatcher,
    region: String,
}

impl NotificationEngine {
    pub fn new(object_base: impl Into<PathBuf>, function_service_base_url: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            store: ConfigStore::new(object_base),
            dispatcher: Dispatcher::new(function_service_base_url),
            region: region.into(),
        }
    }

    pub async fn put_config(&self, bucket: &str, xml_body: &str) -> Result<()> {
        self.store.put(bucket, xml_body).await
    }

    /// Synthesises the event JSON, evaluates every configured handler's
    /// event pattern and filter, and spawns a fire-and-forget dispatch for
    /// each match. Never returns an error: a failure to even load the
    /// bucket's configuration is logged and treated as "no handlers".
    pub async fn notify(&self, event: ObjectEvent) {
        let cfg = match self.store.load(&event.bucket).await {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(bucket = %event.bucket, error = %e, "failed to load notification configuration");
                return;
            }
        };
        let json = event.to_json(&self.region);
        for handler in cfg.matching_handlers(&event) {
            let dispatcher = self.dispatcher.clone();
            let target_arn = handler.target_arn.clone();
            let json = json.clone();
            tokio::spawn(async move { dispatcher.dispatch(&target_arn, &json).await });
        }
    }
}
