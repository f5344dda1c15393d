//! Entry point for the function service's HTTP control plane (spec §6.1).

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::Request;
use burrow_lambda::{FunctionManager, ManagerConfig};
use burrow_lambda_http::AppState;
use clap::Parser;
use mimalloc::MiMalloc;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[clap(flatten)]
    config: burrow_core::Config,

    /// Address the function HTTP control plane listens on (spec §6.1).
    #[arg(long, env = "BURROW_FUNCTION_SERVICE_ADDR", default_value = "0.0.0.0:80")]
    listen_addr: std::net::SocketAddr,

    /// Path to the `burrow-worker-host` binary spawned per installation.
    #[arg(long, env = "BURROW_WORKER_HOST_BIN", default_value = "burrow-worker-host")]
    worker_host_bin: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    burrow_core::telemetry::init("burrow_lambda_http=info,burrow_lambda=info,warn");
    cli.config.ensure_dirs()?;

    let manager_config = ManagerConfig::from_core_config(&cli.config, cli.worker_host_bin);
    let manager = Arc::new(FunctionManager::new(manager_config));
    let state = AppState::new(manager.clone());

    let app = burrow_lambda_http::gen_router()
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!("request", request_id = %Uuid::new_v4(), method = %req.method(), path = %req.uri().path())
        }))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(cli.listen_addr).await?;
    info!(listen_addr = %cli.listen_addr, "starting function service");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(manager))
        .await?;
    Ok(())
}

async fn shutdown_signal(manager: Arc<FunctionManager>) {
    tokio::signal::ctrl_c().await.expect("failed to install ctrl_c handler");
    info!("received shutdown signal, tearing down installations");
    manager.shutdown().await;
}
