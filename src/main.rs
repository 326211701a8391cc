//! OpsDesk - Agency Back-Office Service
//!
//! Pricing estimates, code access request handling with scheduled
//! auto-approval, and content metadata extraction over an HTTP API.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opsdesk::services::ApprovalScheduler;
use opsdesk::{api, config, AppState, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opsdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::init();
    tracing::info!(
        "Starting OpsDesk server on {}:{}",
        config.server.host,
        config.server.port
    );

    // Initialize application state
    let state = AppState::new().await?;
    tracing::info!("Application state initialized");

    // Initialize startup time for uptime tracking
    api::status::init_startup_time();

    // Start the auto-approval scheduler
    let scheduler = ApprovalScheduler::new(state.approvals.clone());
    let _scheduler_handle = scheduler.start().await;
    tracing::info!("Auto-approval scheduler started");

    // Build router
    let app = Router::new()
        .merge(api::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("Invalid address");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("========================================");
    tracing::info!("  OPSDESK SERVER STARTED SUCCESSFULLY");
    tracing::info!("  Ready to accept connections on {}", addr);
    tracing::info!("========================================");

    axum::serve(listener, app).await?;

    Ok(())
}
