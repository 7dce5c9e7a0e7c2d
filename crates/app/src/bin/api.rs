// Greenlight API server

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use greenlight_app::{create_app, AppState};
use greenlight_common::config::{Config, Environment};
use greenlight_common::db;
use greenlight_email::{EmailConfig, EmailServiceFactory};

const DEFAULT_LOG_FILTER: &str = "greenlight=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.environment);

    info!(
        environment = config.environment.as_str(),
        port = config.port,
        "Starting Greenlight API server"
    );

    let pool = db::connect(&config.database).await.map_err(|e| {
        error!(error = %e, "Failed to connect to database");
        anyhow::anyhow!("Database connection failed: {}", e)
    })?;

    info!("Database connection established");

    let email_config = EmailConfig::from_env()?;
    let email = EmailServiceFactory::create(email_config).await?;

    let state = AppState::postgres(config.clone(), pool, email);
    let app = create_app(state.clone());

    let sweeper_shutdown = CancellationToken::new();
    let sweeper = state.limiter.spawn_sweeper(sweeper_shutdown.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper_shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Rate limiter sweeper ended abnormally");
    }

    info!(
        in_flight = state.background.in_flight(),
        "Waiting for background tasks"
    );
    if !state.background.shutdown(config.shutdown_grace).await {
        warn!(
            grace_secs = config.shutdown_grace.as_secs(),
            "Background tasks still running at shutdown deadline"
        );
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(environment: Environment) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if environment == Environment::Production {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
