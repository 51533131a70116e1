//! FormRelay web server.
//!
//! Serves the contact and testimonial endpoints until SIGINT/SIGTERM, then
//! drains in-flight requests and exits.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formrelay::{
    build_router, AppState, Config, InMemoryTestimonialStore, RecaptchaVerifier, ResendMailer,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        allowed_origins = ?config.allowed_origins,
        auto_approve = config.auto_approve,
        send_confirmation = config.send_confirmation,
        owner_email_configured = config.owner_email.is_some(),
        approval_links_enabled = config.approval_links_enabled(),
        request_timeout_ms = config.request_timeout_ms,
        "config_loaded"
    );
    if config.allowed_origins.is_none() {
        tracing::warn!("allowed_origins_not_configured_allowing_any");
    }

    // One HTTP client for the verifier and the email provider
    let client = Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to create HTTP client")?;

    let verifier = Arc::new(RecaptchaVerifier::new(client.clone(), &config));
    let mailer = Arc::new(ResendMailer::new(client, &config));
    let store = Arc::new(InMemoryTestimonialStore::new());

    let port = config.port;
    let state = AppState::new(config, verifier, mailer, store);
    let app = build_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
