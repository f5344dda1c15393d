//! Entry point for the object service's HTTP control plane (spec §6.2).

use std::sync::Arc;

use axum::extract::Request;
use burrow_blobstore::BlobStore;
use burrow_notify::NotificationEngine;
use burrow_woof::FileWoofStore;
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

    /// Address the object HTTP control plane listens on (spec §6.2).
    #[arg(long, env = "BURROW_OBJECT_SERVICE_ADDR", default_value = "0.0.0.0:8081")]
    listen_addr: std::net::SocketAddr,

    /// Region string stamped into synthesized event JSON (spec §6.4).
    #[arg(long, env = "BURROW_AWS_REGION", default_value = "us-west-1")]
    region: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    burrow_core::telemetry::init("burrow_object_http=info,burrow_notify=info,warn");
    cli.config.ensure_dirs()?;

    let woof = Arc::new(FileWoofStore::open(&cli.config.object_base)?);
    let blob_store = Arc::new(
        BlobStore::with_capacities(woof, cli.config.shards_per_log, cli.config.bucket_index_capacity).await?,
    );
    let notify = Arc::new(NotificationEngine::new(
        cli.config.object_base.clone(),
        cli.config.function_service_url.clone(),
        cli.region,
    ));
    let state = burrow_object_http::AppState::new(blob_store, notify);

    let app = burrow_object_http::gen_router()
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!("request", request_id = %Uuid::new_v4(), method = %req.method(), path = %req.uri().path())
        }))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(cli.listen_addr).await?;
    info!(listen_addr = %cli.listen_addr, "starting object service");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.expect("failed to install ctrl_c handler");
            info!("received shutdown signal");
        })
        .await?;
    Ok(())
}
