//! Railguard Server - always-on backend for railway hazard advisories

mod api;
mod config;
mod loops;
mod state;

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::loops::LoopHandle;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("railguard_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting Railguard Server...");

    let config = Config::from_env();
    let port = config.server_port;
    let state = Arc::new(AppState::new(config.clone()));

    // Start background loops
    let advisory = LoopHandle::spawn("advisory", {
        let state = state.clone();
        let tick = config.advisory_tick_secs;
        move |shutdown| loops::advisory_loop::run(state, tick, shutdown)
    });
    let expiry = LoopHandle::spawn("expiry", {
        let state = state.clone();
        let sweep = config.expiry_sweep_secs;
        move |shutdown| loops::expiry_loop::run(state, sweep, shutdown)
    });

    // Build the app
    let app = api::routes(&config)
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    advisory.stop().await;
    expiry.stop().await;

    Ok(())
}
