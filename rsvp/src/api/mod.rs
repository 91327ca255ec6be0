//! HTTP endpoints.
//!
//! - `POST /events`, `GET /events` - [`events`]
//! - `POST /events/:event_id/register` - [`registrations`]
//! - `GET /events/:event_id/attendees` - [`attendees`]

pub mod attendees;
pub mod events;
pub mod registrations;

use crate::error::RegistrationError;
use crate::types::{EventId, PageRequest};
use rsvp_web::AppError;
use serde::Deserialize;
use uuid::Uuid;

/// `?page=&page_size=` query parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page: Option<u32>,
    /// Items per page (default 10, max 100)
    pub page_size: Option<u32>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        Self::new(query.page, query.page_size)
    }
}

/// Parse an event id path segment; anything that is not a UUID names no event.
pub(crate) fn parse_event_id(raw: &str) -> Result<EventId, AppError> {
    Uuid::parse_str(raw)
        .map(EventId::from_uuid)
        .map_err(|_| AppError::from(RegistrationError::EventNotFound))
}
