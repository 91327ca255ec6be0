//! Registration endpoint.
//!
//! - POST /events/:event_id/register - Register an attendee for an event

use super::parse_event_id;
use crate::error::RegistrationError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rsvp_web::{ApiJson, AppError, CorrelationId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to register for an event.
///
/// Both fields are optional at the JSON level so a missing field reports a
/// field error rather than a body error.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Attendee name
    pub name: Option<String>,
    /// Attendee email
    pub email: Option<String>,
}

/// Successful registration acknowledgement.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Human-readable confirmation
    pub message: &'static str,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RegistrationError> {
    value.ok_or_else(|| RegistrationError::invalid(field, "This field is required."))
}

// ============================================================================
// Handlers
// ============================================================================

/// Register an attendee for an event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/events/{event_id}/register \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Asha Rao", "email": "asha@example.com"}'
/// ```
///
/// # Errors
///
/// - 404 when the event does not exist
/// - 400 for invalid input, duplicate registrations and full events
/// - 503 when the registration pipeline does not answer in time
pub async fn register(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Path(event_id): Path<String>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let event_id = parse_event_id(&event_id)?;
    let name = required(request.name, "name")?;
    let email = required(request.email, "email")?;

    let registration = state
        .registrations
        .register(event_id, name, email)
        .await
        .inspect_err(|err| {
            tracing::info!(
                correlation_id = %correlation_id.0,
                %event_id,
                reason = err.label(),
                "Registration refused"
            );
        })?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        %event_id,
        registration_id = %registration.id,
        "Registration accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful",
        }),
    ))
}
