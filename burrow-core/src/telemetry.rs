//! Minimal tracing bootstrap shared by every binary in the workspace.
//!
//! The real AWS-compatible deployment this platform imitates has no use for
//! the distributed-tracing exporters a larger service mesh would carry
//! (spec §1 Non-goals exclude bug-compatibility/observability surfaces
//! beyond what's exercised here), but structured logging itself is not
//! optional ambient infrastructure — every `burrow-*` binary initialises the
//! same `fmt` + `EnvFilter` layer before doing anything else.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the global tracing subscriber. Safe to call once per process;
/// a second call is a logic error in the caller, not handled gracefully.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .init();
}
