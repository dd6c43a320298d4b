//! CSMS Service
//!
//! OCPP 1.6J central system with an admin HTTP API.
//! Reads configuration from TOML (`$CSMS_CONFIG` or ~/.config/csms-service/config.toml).

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use csms::config::LoggingConfig;
use csms::shared::shutdown::ShutdownCoordinator;
use csms::{
    config_path_from_env, create_api_router, ApiState, AppConfig, CentralSystem,
    InMemoryRepositoryProvider, OcppServer,
};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = config_path_from_env();
    let (app_cfg, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_tracing(&app_cfg.logging);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
    }

    info!("Starting CSMS Service...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = match metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
    {
        Ok(handle) => {
            info!("📊 Prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!("Prometheus recorder unavailable, /metrics disabled: {}", e);
            None
        }
    };

    // ── Central system core ────────────────────────────────────
    let repos = Arc::new(InMemoryRepositoryProvider::new());
    let mut system = CentralSystem::new(repos, app_cfg.ocpp.clone());

    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    let background = system.start(shutdown_signal.clone());

    // ── OCPP WebSocket server ──────────────────────────────────
    let server = OcppServer::new(app_cfg.ws_address(), system.registry.clone())
        .with_shutdown(shutdown_signal.clone());

    // ── Admin API ──────────────────────────────────────────────
    let api_router = create_api_router(ApiState::new(&system), prometheus_handle);
    let api_addr = app_cfg.api_address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("🛑 REST API server received shutdown signal");
    });

    info!("🚀 All servers started. Press Ctrl+C to shutdown gracefully.");

    let ws_result = tokio::spawn(async move { server.run().await });
    let api_result = tokio::spawn(async move { api_server.await });

    tokio::select! {
        result = ws_result => {
            match result {
                Ok(Ok(())) => info!("WebSocket server stopped"),
                Ok(Err(e)) => error!("WebSocket server error: {}", e),
                Err(e) => error!("WebSocket server task panicked: {}", e),
            }
        }
        result = api_result => {
            match result {
                Ok(Ok(())) => info!("REST API server stopped"),
                Ok(Err(e)) => error!("REST API server error: {}", e),
                Err(e) => error!("REST API server task panicked: {}", e),
            }
        }
    }

    // A server exiting on its own still takes the background tasks down.
    shutdown_signal.trigger();

    let pending = system.commands.pending_count();
    shutdown
        .shutdown_with_cleanup(|| async move {
            info!("🧹 Waiting for background tasks ({} pending commands)...", pending);
            for handle in background {
                if let Err(e) = handle.await {
                    warn!("Background task ended abnormally: {}", e);
                }
            }
        })
        .await;

    info!("👋 CSMS Service shutdown complete");
    Ok(())
}
