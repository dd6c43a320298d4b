//! Admin API router

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{commands, health, id_tags, metrics, stations, transactions};
use crate::application::commands::SharedCommandSender;
use crate::application::services::Services;
use crate::application::session::SharedChannelRegistry;
use crate::application::CentralSystem;

#[derive(Clone)]
pub struct ApiState {
    pub registry: SharedChannelRegistry,
    pub commands: SharedCommandSender,
    pub services: Services,
    pub started_at: Arc<Instant>,
}

impl ApiState {
    pub fn new(system: &CentralSystem) -> Self {
        Self {
            registry: system.registry.clone(),
            commands: system.commands.clone(),
            services: system.services.clone(),
            started_at: Arc::new(Instant::now()),
        }
    }
}

/// `/metrics` is mounted only when a Prometheus recorder is installed.
pub fn create_api_router(state: ApiState, prometheus: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/stations", get(stations::list_stations))
        .route(
            "/api/v1/stations/{id}/transactions",
            get(stations::list_station_transactions),
        )
        .route(
            "/api/v1/stations/{id}/charging-profiles",
            get(stations::list_charging_profiles),
        )
        .route(
            "/api/v1/stations/{id}/commands/{action}",
            post(commands::send_command),
        )
        .route(
            "/api/v1/transactions/{id}/stop",
            post(transactions::stop_transaction),
        )
        .route(
            "/api/v1/id-tags",
            get(id_tags::list_id_tags).post(id_tags::create_id_tag),
        )
        .route("/api/v1/id-tags/{id_tag}/block", post(id_tags::block_id_tag))
        .with_state(state);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    router.layer(TraceLayer::new_for_http()).layer(cors)
}
