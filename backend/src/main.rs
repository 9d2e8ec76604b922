//! Ticket Selector Crank
//!
//! Off-chain operator for one selector account. Runs three concurrent
//! subsystems:
//!
//! - **Crank**: submits bounded draw batches for the configured phase until
//!   its target is reached, optionally finalizing the eligibility phase.
//! - **Listener + auditor**: WebSocket subscription to the selector's events;
//!   every winner is recomputed from the seed and compared.
//! - **HTTP server**: liveness (`/health`), progress (`/status`) and
//!   counters (`/metrics`).

use actix_web::{App, HttpResponse, HttpServer, web};
use solana_sdk::signature::Signer;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod audit;
mod config;
mod crank;
mod listener;
mod metrics;
mod snapshot;

use config::AppConfig;
use crank::CrankStatus;
use metrics::Metrics;

/// Shared application state accessible from HTTP handlers.
struct AppState {
    status: Arc<RwLock<CrankStatus>>,
    metrics: Arc<Metrics>,
}

/// Liveness probe: returns 200 if the process is running.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Crank progress for the configured phase.
async fn status(data: web::Data<AppState>) -> HttpResponse {
    let status = data.status.read().await.clone();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "running",
        "crank": status,
    }))
}

async fn metrics(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.metrics.to_json())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,solana_client=warn,solana_rpc_client=warn,hyper=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::other(format!("invalid configuration: {e:#}")))?;

    info!(
        program = %config.program_id,
        selector = %config.selector,
        authority = %config.authority_keypair.pubkey(),
        phase = ?config.crank_phase,
        target = ?config.crank_target,
        batch_size = config.batch_size,
        "Starting selector crank"
    );
    info!(rpc = %config.rpc_url, ws = %config.ws_url, "Endpoints configured");

    let shared_metrics = Arc::new(Metrics::new());
    let shared_status = Arc::new(RwLock::new(CrankStatus::default()));
    let (tx, rx) = mpsc::channel(1024);

    // Background: stream the selector's events to the auditor.
    let listener_config = config.clone();
    tokio::spawn(async move {
        listener::listen_for_events(listener_config, tx).await;
    });

    // Background: verify stored history, then every live winner.
    let auditor_config = config.clone();
    let auditor_metrics = shared_metrics.clone();
    tokio::spawn(async move {
        audit::run_auditor(auditor_config, rx, auditor_metrics).await;
    });

    // Background: draw batches for the configured phase.
    if let Some(phase) = config.crank_phase {
        let crank_config = config.clone();
        let crank_metrics = shared_metrics.clone();
        let crank_status = shared_status.clone();
        tokio::spawn(async move {
            crank::run_crank(crank_config, phase, crank_metrics, crank_status).await;
        });
    } else {
        info!("CRANK_PHASE not set, running listener and auditor only");
    }

    let state = web::Data::new(AppState {
        status: shared_status,
        metrics: shared_metrics,
    });
    let addr = ("0.0.0.0", config.http_port);

    info!(port = config.http_port, "Starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health))
            .route("/status", web::get().to(status))
            .route("/metrics", web::get().to(metrics))
    })
    .bind(addr)?
    .run()
    .await
}
