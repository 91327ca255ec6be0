//! Domain types for event registration.
//!
//! Events, attendees and the registrations that link them, plus the paging
//! envelope shared by the list endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an attendee
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendeeId(Uuid);

impl AttendeeId {
    /// Creates a new random `AttendeeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AttendeeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttendeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random `RegistrationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RegistrationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Maximum number of registrations an event accepts. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub struct Capacity(u32);

impl Capacity {
    /// Largest capacity the relational store can hold (`INTEGER` column).
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// Create a capacity, `None` when zero or above [`Capacity::MAX`].
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 || value > Self::MAX {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Get the capacity value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether `registered` registrations leave no room for another one.
    #[must_use]
    pub const fn is_reached_by(self, registered: u64) -> bool {
        registered >= self.0 as u64
    }
}

impl TryFrom<u32> for Capacity {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("capacity must be between 1 and {}", Self::MAX))
    }
}

impl From<Capacity> for u32 {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A schedulable activity with a time window and a capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Where the event takes place
    pub location: String,
    /// Start instant
    pub start_time: DateTime<Utc>,
    /// End instant, strictly after `start_time`
    pub end_time: DateTime<Utc>,
    /// Registration limit
    pub max_capacity: Capacity,
}

impl Event {
    /// Materialize a validated [`NewEvent`] under a fresh id.
    #[must_use]
    pub fn from_new(new_event: NewEvent) -> Self {
        Self {
            id: EventId::new(),
            name: new_event.name,
            location: new_event.location,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            max_capacity: new_event.max_capacity,
        }
    }

    /// Whether the event has not started yet at `now` (inclusive).
    #[must_use]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time >= now
    }
}

/// Validated input for creating an event.
///
/// Built by [`crate::validation::validate_new_event`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEvent {
    /// Trimmed name
    pub name: String,
    /// Trimmed location
    pub location: String,
    /// Start instant
    pub start_time: DateTime<Utc>,
    /// End instant
    pub end_time: DateTime<Utc>,
    /// Registration limit
    pub max_capacity: Capacity,
}

/// A person identified by email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Attendee identifier
    pub id: AttendeeId,
    /// Name given at the attendee's first registration
    pub name: String,
    /// Lowercased email, unique across attendees
    pub email: String,
}

/// A confirmed link between one attendee and one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Registration identifier
    pub id: RegistrationId,
    /// Event registered for
    pub event_id: EventId,
    /// Registered attendee
    pub attendee_id: AttendeeId,
    /// When the registration was committed
    pub created_at: DateTime<Utc>,
}

/// Validated registration request: trimmed name and lowercased email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registrant {
    /// Trimmed name
    pub name: String,
    /// Lowercased email
    pub email: String,
}

// ============================================================================
// Paging
// ============================================================================

/// Page selection for list queries (1-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Page size used when the caller does not pick one.
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    /// Largest page size a caller may request.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Build a page request, clamping `page` to at least 1 and `page_size`
    /// into `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(Self::DEFAULT_PAGE_SIZE)
                .clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    /// 1-based page number
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Items per page
    #[must_use]
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// Number of items to skip
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    /// Number of items to take
    #[must_use]
    pub const fn limit(self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total number of matching items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total matching items across all pages
    pub count: u64,
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
    /// Items on this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page for `request`.
    #[must_use]
    pub const fn new(request: PageRequest, count: u64, results: Vec<T>) -> Self {
        Self {
            count,
            page: request.page,
            page_size: request.page_size,
            results,
        }
    }

    /// Slice an in-memory, already ordered collection.
    #[must_use]
    pub fn from_ordered(request: PageRequest, items: Vec<T>) -> Self {
        let count = items.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let results = items.into_iter().skip(offset).take(limit).collect();
        Self::new(request, count, results)
    }

    /// Transform every item, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
