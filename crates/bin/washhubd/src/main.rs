//! # washhubd — washhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`washhub.toml`, env vars)
//! - Install the `tracing` subscriber
//! - Construct the cloud client (the virtual cloud) and the event bus
//! - Construct the washer service, discover washers and start polling
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (Ctrl-C): stop the server, then every poll timer
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use washhub_adapter_http_axum::state::AppState;
use washhub_adapter_virtual::VirtualCloud;
use washhub_app::event_bus::InProcessEventBus;
use washhub_app::services::washer_service::WasherService;
use washhub_domain::event::{SyncEvent, SyncEventKind};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Cloud
    let devices = config.virtual_cloud.build_devices()?;
    let cloud =
        Arc::new(VirtualCloud::new(devices).with_latency(config.virtual_cloud.latency()));

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let event_log = tokio::spawn(log_sync_events(event_bus.subscribe()));

    // Services
    let washer_service = Arc::new(WasherService::new(
        cloud,
        Arc::clone(&event_bus),
        config.polling.settings(),
        config.polling.intervals(),
    ));
    let washers = washer_service.discover().await?;
    tracing::info!(
        washers = washers.len(),
        fast_secs = config.polling.fast_interval_secs,
        slow_secs = config.polling.slow_interval_secs,
        "polling started"
    );

    // HTTP
    let state = AppState::new(Arc::clone(&washer_service), event_bus);
    let app = washhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "washhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    washer_service.shutdown();
    event_log.abort();
    tracing::info!("washhubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn log_sync_events(mut events: broadcast::Receiver<SyncEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match event.kind {
                SyncEventKind::SnapshotReplaced { sequence } => tracing::debug!(
                    device_id = %event.device_id,
                    cadence = %event.cadence,
                    sequence,
                    "snapshot replaced"
                ),
                SyncEventKind::PollFailed {
                    consecutive_failures,
                    available,
                    reason,
                } => tracing::warn!(
                    device_id = %event.device_id,
                    cadence = %event.cadence,
                    consecutive_failures,
                    available,
                    %reason,
                    "poll failed"
                ),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "sync event log lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
