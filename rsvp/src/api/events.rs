//! Event endpoints.
//!
//! - POST /events - Create an event, times read in the caller's timezone
//! - GET /events - Upcoming events, earliest first, paginated

use super::PageQuery;
use crate::server::state::AppState;
use crate::timezone::{CallerTimezone, TimeInput, format_local};
use crate::types::{Event, Page};
use crate::validation::{EventDraft, validate_new_event};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono_tz::Tz;
use rsvp_web::{ApiJson, ApiQuery, AppError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a new event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event name
    pub name: String,
    /// Event location
    pub location: String,
    /// Start time (naive values are read in the caller's timezone)
    pub start_time: TimeInput,
    /// End time (naive values are read in the caller's timezone)
    pub end_time: TimeInput,
    /// Registration limit
    pub max_capacity: i64,
}

/// Event as rendered for a caller.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event ID
    pub id: Uuid,
    /// Event name
    pub name: String,
    /// Event location
    pub location: String,
    /// Start time, `DD/MM/YYYY hh:mm AM/PM` in the caller's timezone
    pub start_time: String,
    /// End time, `DD/MM/YYYY hh:mm AM/PM` in the caller's timezone
    pub end_time: String,
    /// Registration limit
    pub max_capacity: u32,
}

impl EventResponse {
    /// Render `event` for a caller in `tz`.
    #[must_use]
    pub fn render(event: Event, tz: Tz) -> Self {
        Self {
            id: *event.id.as_uuid(),
            start_time: format_local(event.start_time, tz),
            end_time: format_local(event.end_time, tz),
            name: event.name,
            location: event.location,
            max_capacity: event.max_capacity.value(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/events \
///   -H "Content-Type: application/json" \
///   -H "Timezone: America/New_York" \
///   -d '{
///     "name": "Rust Meetup",
///     "location": "Community Hall",
///     "start_time": "2025-09-25T10:20",
///     "end_time": "2025-09-25T12:00",
///     "max_capacity": 40
///   }'
/// ```
///
/// # Errors
///
/// Returns 400 for malformed bodies and validation failures.
pub async fn create_event(
    State(state): State<AppState>,
    CallerTimezone(tz): CallerTimezone,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    let draft = EventDraft {
        name: request.name,
        location: request.location,
        start_time: request.start_time.to_utc(tz, "start_time")?,
        end_time: request.end_time.to_utc(tz, "end_time")?,
        max_capacity: request.max_capacity,
    };
    let new_event = validate_new_event(draft)?;

    let event = state.catalog.create_event(new_event).await?;
    crate::metrics::record_event_created();

    Ok((StatusCode::CREATED, Json(EventResponse::render(event, tz))))
}

/// List upcoming events.
///
/// # Errors
///
/// Returns 500 if the catalog cannot be read.
pub async fn list_events(
    State(state): State<AppState>,
    CallerTimezone(tz): CallerTimezone,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<EventResponse>>, AppError> {
    let page = state
        .catalog
        .list_upcoming(state.clock.now(), query.into())
        .await?;

    Ok(Json(page.map(|event| EventResponse::render(event, tz))))
}
