//! SSO Broker Auth API server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use auth_api::config::Config;
use auth_api::session::MemorySessionStore;
use auth_api::state::AppState;
use ssobroker_auth_core::create_default_generator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("auth_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SSO Broker Auth API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        profile = %config.profile,
        "Configuration loaded"
    );

    if config.allowed_service_endpoints.is_empty() {
        tracing::warn!("No allowed service endpoints set in configuration");
    } else {
        tracing::debug!(
            "Allowing requests from:\n  {}",
            config.allowed_service_endpoints.join("\n  ")
        );
    }
    if config.login_bypass.engaged {
        tracing::warn!(
            user = config.login_bypass.testuser.id(),
            "SAML-based logins have been disabled!"
        );
    }

    // Installed once, before any request is served
    let generator = create_default_generator(&config.token)?;

    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));
    let http_port = config.http_port;
    let state = AppState::new(config, generator, sessions);

    let app = auth_api::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
