//! Router configuration.

use super::health::{health_check, metrics, readiness_check};
use super::state::AppState;
use crate::api::{attendees, events, registrations};
use axum::{
    Router,
    routing::{get, post},
};
use rsvp_web::correlation_id_layer;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Every request passes through the correlation-id layer and a trace layer.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        // Events
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/:event_id/register", post(registrations::register))
        .route("/events/:event_id/attendees", get(attendees::list_attendees))
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
