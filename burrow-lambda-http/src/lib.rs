//! HTTP façade for the function service (spec §6.1): a thin axum router
//! mapping AWS Lambda-shaped request paths onto `burrow_lambda::FunctionManager`.

mod handlers;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use burrow_lambda::FunctionManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<FunctionManager>,
}

impl AppState {
    pub fn new(manager: Arc<FunctionManager>) -> Self {
        Self { manager }
    }
}

/// Builds the router without attaching state, mirroring the workspace's
/// other HTTP crates (`with_state` is applied by the caller so tests can
/// swap in a differently-configured `AppState`).
pub fn gen_router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/2015-03-31/functions", post(handlers::create_function))
        .route("/2015-03-31/functions/:name/code", put(handlers::update_function_code))
        .route("/2015-03-31/functions/:name", delete(handlers::delete_function))
        .route("/2015-03-31/functions/:name/invocations", post(handlers::invoke_function))
}
