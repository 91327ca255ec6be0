//! RSVP HTTP server.
//!
//! Loads configuration from the environment, migrates the database and
//! serves the registration API until Ctrl+C or SIGTERM.

use anyhow::Context;
use rsvp::{AppState, Config, PostgresStore, RegistrationService, build_router};
use rsvp_core::environment::SystemClock;
use rsvp_runtime::metrics::MetricsExporter;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rsvp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RSVP HTTP server");

    // Load configuration
    let config = Config::from_env();
    let default_timezone = config.default_timezone();
    info!(
        bind_address = %config.bind_address(),
        default_timezone = %default_timezone.name(),
        metrics_enabled = config.server.metrics_enabled,
        "Configuration loaded"
    );

    let exporter = if config.server.metrics_enabled {
        let exporter = MetricsExporter::install().context("Failed to install metrics exporter")?;
        rsvp::metrics::register_business_metrics();
        Some(exporter)
    } else {
        None
    };

    // Database
    let store = PostgresStore::connect(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store.migrate().await.context("Failed to run migrations")?;
    info!("Database ready");
    let store = Arc::new(store);

    // Registration pipeline
    let clock = Arc::new(SystemClock);
    let registrations = RegistrationService::new(
        store.clone(),
        clock.clone(),
        config.registration_timeout(),
    );

    let mut state = AppState::new(store, registrations.clone(), clock, default_timezone);
    if let Some(exporter) = exporter {
        state = state.with_metrics(exporter);
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("HTTP server stopped, draining registrations");
    if let Err(err) = registrations.shutdown(config.shutdown_timeout()).await {
        warn!(error = %err, "Registrations still in flight at shutdown");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolve when Ctrl+C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
