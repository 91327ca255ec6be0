//! Attendee listing endpoint.
//!
//! - GET /events/:event_id/attendees - Attendees of an event, newest first

use super::{PageQuery, parse_event_id};
use crate::server::state::AppState;
use crate::types::{Attendee, Page};
use axum::{
    Json,
    extract::{Path, State},
};
use rsvp_web::{ApiQuery, AppError};
use serde::Serialize;
use uuid::Uuid;

/// Attendee as returned by the listing.
#[derive(Debug, Serialize)]
pub struct AttendeeResponse {
    /// Attendee ID
    pub id: Uuid,
    /// Attendee name
    pub name: String,
    /// Attendee email (lowercase)
    pub email: String,
}

impl From<Attendee> for AttendeeResponse {
    fn from(attendee: Attendee) -> Self {
        Self {
            id: *attendee.id.as_uuid(),
            name: attendee.name,
            email: attendee.email,
        }
    }
}

/// List the attendees registered for an event.
///
/// # Errors
///
/// Returns 404 when the event does not exist.
pub async fn list_attendees(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<AttendeeResponse>>, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let page = state
        .catalog
        .list_attendees(event_id, query.into())
        .await?;

    Ok(Json(page.map(AttendeeResponse::from)))
}
