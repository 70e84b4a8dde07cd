//! MUN back-office server - main entry point

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use mun_common::logging::{init_logging, LogConfig};
use sqlx::postgres::PgPoolOptions;
use tokio::{signal, sync::Notify};
use tower_http::compression::CompressionLayer;
use tracing::info;

use mun_server::{
    audit::Auditor,
    config::Config,
    features,
    middleware::{self, audit::AuditScopeLayer},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::from_env()
        .unwrap_or_default()
        .with_prefix("mun-server");
    init_logging(&log_config)?;

    info!("Starting MUN server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await?;

    info!("Database connection pool established");

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    let auditor = Auditor::new(config.audit.clone());
    let state = features::FeatureState {
        db: db_pool,
        auditor: auditor.clone(),
        session: config.session.clone(),
    };

    let app = create_router(state, &config, auditor);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_started = Arc::new(Notify::new());
    let graceful = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_started.clone()));

    tokio::select! {
        result = graceful => {
            result?;
            info!("Server shut down gracefully");
        },
        _ = drain_deadline(
            shutdown_started,
            Duration::from_secs(config.server.shutdown_timeout_secs),
        ) => {
            tracing::warn!(
                timeout_secs = config.server.shutdown_timeout_secs,
                "Shutdown drain timeout elapsed; closing remaining connections"
            );
        },
    }

    Ok(())
}

/// Resolves `timeout` after the shutdown signal has fired, bounding how long
/// in-flight requests may delay process exit.
async fn drain_deadline(started: Arc<Notify>, timeout: Duration) {
    started.notified().await;
    tokio::time::sleep(timeout).await;
}

/// Create the application router with all routes and middleware
fn create_router(
    state: features::FeatureState,
    config: &Config,
    auditor: std::sync::Arc<Auditor>,
) -> Router {
    let cookie_name = config.session.cookie_name.clone();

    Router::new()
        .merge(features::health_routes(state.clone()))
        .nest("/api", features::router(state))
        // Layers apply innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
        .layer(AuditScopeLayer::new(auditor, cookie_name))
}

/// Graceful shutdown signal handler. Notifies `started` once a signal
/// arrives so the caller can start the drain deadline.
async fn shutdown_signal(started: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    started.notify_one();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_drain_deadline_waits_for_signal_then_timeout() {
        let started = Arc::new(Notify::new());
        let deadline = drain_deadline(started.clone(), Duration::from_secs(30));
        tokio::pin!(deadline);

        // Without the signal the deadline never starts counting.
        let idle = tokio::time::timeout(Duration::from_secs(300), &mut deadline).await;
        assert!(idle.is_err());

        started.notify_one();
        let fired = tokio::time::timeout(Duration::from_secs(31), &mut deadline).await;
        assert!(fired.is_ok());
    }
}
