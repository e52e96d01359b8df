//! ID Scan Server
//!
//! Extracts identity-document fields from uploaded PDFs and keeps the
//! results of the current session in a JSON store.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idscan_server::config::Config;
use idscan_server::routes;
use idscan_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idscan_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    // Any malformed variable aborts startup
    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!("Starting ID Scan Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Document store: {}", config.store.path.display());
    tracing::info!(
        "OCR: {} ({}, {} DPI)",
        config.ocr.tesseract_path,
        config.ocr.languages,
        config.ocr.dpi
    );
    if config.openai.api_key.is_none() {
        tracing::info!("No OPENAI_API_KEY set; uploads must carry an api_key field");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;

    // Create application state; this begins the session and resets the store
    let app_state = AppState::new(config)
        .await
        .context("Failed to initialize document store")?;

    let app = routes::app(app_state);

    tracing::info!("ID Scan Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
