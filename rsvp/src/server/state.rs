//! Application state for the HTTP server.

use crate::providers::EventCatalog;
use crate::registration::RegistrationService;
use crate::timezone::DefaultTimezone;
use axum::extract::FromRef;
use chrono_tz::Tz;
use rsvp_core::environment::Clock;
use rsvp_runtime::metrics::MetricsExporter;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Event catalog (read side and event creation)
    pub catalog: Arc<dyn EventCatalog>,

    /// Registration pipeline (write side)
    pub registrations: RegistrationService,

    /// Clock deciding which events are upcoming
    pub clock: Arc<dyn Clock>,

    /// Zone used when a request names none
    pub default_timezone: Tz,

    /// Prometheus exporter, when metrics are enabled
    pub metrics: Option<MetricsExporter>,
}

impl AppState {
    /// Create a new application state without a metrics exporter.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn EventCatalog>,
        registrations: RegistrationService,
        clock: Arc<dyn Clock>,
        default_timezone: Tz,
    ) -> Self {
        Self {
            catalog,
            registrations,
            clock,
            default_timezone,
            metrics: None,
        }
    }

    /// Serve `exporter` at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, exporter: MetricsExporter) -> Self {
        self.metrics = Some(exporter);
        self
    }
}

impl FromRef<AppState> for DefaultTimezone {
    fn from_ref(app_state: &AppState) -> Self {
        Self(app_state.default_timezone)
    }
}
