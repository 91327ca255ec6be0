//! Storage abstractions injected into handlers and the registration reducer.
//!
//! Both traits return boxed futures instead of `async fn` so they stay
//! object-safe and can be shared as `Arc<dyn ..>`.

use crate::error::Result;
use crate::types::{Attendee, Event, EventId, NewEvent, Page, PageRequest, Registrant, Registration};
use chrono::{DateTime, Utc};

/// Boxed, sendable future returned by provider methods.
pub use futures::future::BoxFuture;

/// Read and write access to events and their attendee lists.
pub trait EventCatalog: Send + Sync {
    /// Persist a validated event under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Storage`](crate::error::RegistrationError::Storage)
    /// if the store rejects the write.
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, Result<Event>>;

    /// Look up a single event.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    fn get_event(&self, id: EventId) -> BoxFuture<'_, Result<Option<Event>>>;

    /// Events starting at or after `now`, earliest first, ties broken by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    fn list_upcoming(
        &self,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> BoxFuture<'_, Result<Page<Event>>>;

    /// Distinct attendees of an event, most recent registration first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EventNotFound`](crate::error::RegistrationError::EventNotFound)
    /// when the event does not exist, or a storage error.
    fn list_attendees(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> BoxFuture<'_, Result<Page<Attendee>>>;

    /// Cheap round trip used by readiness probes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be reached.
    fn ping(&self) -> BoxFuture<'_, Result<()>>;
}

/// Atomic registration of an attendee for an event.
pub trait RegistrationLedger: Send + Sync {
    /// Register `registrant` for `event_id` at `at`.
    ///
    /// Finds or creates the attendee by email, then inserts the registration
    /// unless the attendee is already registered or the event is full. The
    /// capacity check and the insert are atomic with respect to concurrent
    /// calls for the same event.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event does not exist
    /// - `DuplicateRegistration` if the attendee is already registered
    /// - `EventFull` if the event has reached its capacity
    /// - `Storage` on store failure
    fn register<'a>(
        &'a self,
        event_id: EventId,
        registrant: &'a Registrant,
        at: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Registration>>;
}
