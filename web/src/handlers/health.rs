//! Health check responses.
//!
//! Load balancers poll readiness to decide whether to route traffic. The
//! application gathers one [`HealthCheck`] per dependency and lets
//! [`readiness_response`] turn them into a status code and body.

use axum::{Json, http::StatusCode};
use rsvp_runtime::{HealthCheck, HealthStatus};
use serde::Serialize;

/// Aggregated readiness body.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    /// Worst status across all checks
    pub status: HealthStatus,
    /// Individual component checks
    pub checks: Vec<HealthCheck>,
}

/// Build a readiness response from component checks.
///
/// # Status Codes
///
/// - 200 OK: every check is Healthy or Degraded
/// - 503 Service Unavailable: at least one check is Unhealthy
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "checks": [{ "component": "database", "status": "healthy" }]
/// }
/// ```
#[must_use]
pub fn readiness_response(checks: Vec<HealthCheck>) -> (StatusCode, Json<ReadinessReport>) {
    let status = checks
        .iter()
        .map(|c| c.status)
        .fold(HealthStatus::Healthy, HealthStatus::worst);

    let code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(ReadinessReport { status, checks }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_healthy_is_ok() {
        let (code, Json(report)) = readiness_response(vec![
            HealthCheck::healthy("database"),
            HealthCheck::healthy("store"),
        ]);

        assert_eq!(code, StatusCode::OK);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.checks.len(), 2);
    }

    #[test]
    fn test_degraded_is_still_ok() {
        let (code, Json(report)) =
            readiness_response(vec![HealthCheck::degraded("store", "busy")]);

        assert_eq!(code, StatusCode::OK);
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_any_unhealthy_is_unavailable() {
        let (code, Json(report)) = readiness_response(vec![
            HealthCheck::healthy("store"),
            HealthCheck::unhealthy("database", "connection refused"),
        ]);

        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_report_serializes_lowercase_status() {
        let (_, Json(report)) = readiness_response(vec![HealthCheck::healthy("store")]);
        let json = serde_json::to_value(&report).unwrap_or_default();

        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"][0]["component"], "store");
    }
}
