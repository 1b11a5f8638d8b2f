use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clinalyze::{
    AppState, build_router,
    config::{AppConfig, config_path},
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %err, "Server crashed");
        eprintln!("Server crashed: {err:#}");
    }
}

async fn run() -> Result<()> {
    init_tracing();
    if let Err(err) = dotenv() {
        info!(error = %err, "No .env file loaded");
    }

    let mut config = AppConfig::load_from(&config_path())
        .await
        .context("Failed to load application configuration")?;
    config.apply_env_overrides();

    let addr_string = format!("{}:{}", config.server.host, config.server.port);
    let addr = addr_string
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid server address: {addr_string}"))?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        upstream = %config.upstream.base_url,
        model = %config.upstream.model,
        "Loaded configuration"
    );

    let state = Arc::new(AppState::from_config(config)?);
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener on {addr}"))?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server encountered a fatal error")?;
    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal(relays: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received termination signal (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received termination signal (SIGTERM)");
        }
    }
    relays.cancel();
}
