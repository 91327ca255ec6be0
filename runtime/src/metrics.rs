//! Prometheus metrics export.
//!
//! Installs the global `metrics` recorder backed by `metrics-exporter-prometheus`
//! and hands back a [`MetricsExporter`] that renders the scrape payload. The
//! application mounts that payload on its own router.
//!
//! # Example
//!
//! ```ignore
//! use rsvp_runtime::metrics::MetricsExporter;
//!
//! let exporter = MetricsExporter::install()?;
//! let body = exporter.render();
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus exporter handle.
#[derive(Clone)]
pub struct MetricsExporter {
    handle: PrometheusHandle,
}

impl MetricsExporter {
    /// Install the Prometheus recorder and register store metric descriptions.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if the histogram buckets are rejected and
    /// [`MetricsError::Install`] if a global recorder is already installed.
    pub fn install() -> Result<Self, MetricsError> {
        let builder = PrometheusBuilder::new()
            // Configure histogram buckets for latency measurements
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = builder
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_store_metrics();
        tracing::info!("Prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter").finish_non_exhaustive()
    }
}

/// Register descriptions for the metrics emitted by the [`Store`](crate::Store).
fn register_store_metrics() {
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_counter!(
        "store.effects.executed",
        "Total number of effects executed, labelled by effect type"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run a reducer"
    );
    describe_counter!("store.shutdown.initiated", "Store shutdowns started");
    describe_counter!("store.shutdown.completed", "Store shutdowns that drained cleanly");
    describe_counter!("store.shutdown.timeout", "Store shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
}
