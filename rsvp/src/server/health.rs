//! Health, readiness and metrics endpoints.

use super::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rsvp_runtime::HealthCheck;
use rsvp_web::handlers::{ReadinessReport, readiness_response};
use serde::Serialize;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Health check endpoint.
///
/// Returns 200 OK if the process is running. Dependencies are not consulted.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness check endpoint.
///
/// Returns 200 when the database answers a ping and the registration store
/// accepts actions, 503 otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"status":"healthy","checks":[{"component":"database","status":"healthy"},...]}
/// ```
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessReport>) {
    let database = match state.catalog.ping().await {
        Ok(()) => HealthCheck::healthy("database"),
        Err(err) => {
            tracing::warn!(error = %err, "Database ping failed");
            HealthCheck::unhealthy("database", err.to_string())
        }
    };

    readiness_response(vec![database, state.registrations.health()])
}

/// Prometheus scrape endpoint; 404 when metrics are disabled.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(exporter) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            exporter.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
