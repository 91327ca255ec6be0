//! In-memory provider implementations for tests and local development.

use crate::error::{RegistrationError, Result};
use crate::providers::{BoxFuture, EventCatalog, RegistrationLedger};
use crate::types::{
    Attendee, AttendeeId, Event, EventId, NewEvent, Page, PageRequest, Registrant, Registration,
    RegistrationId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    attendees: HashMap<AttendeeId, Attendee>,
    attendees_by_email: HashMap<String, AttendeeId>,
    registrations: Vec<Registration>,
    offline: bool,
}

/// In-memory event catalog and registration ledger.
///
/// All tables sit behind one mutex, so each registration's checks and insert
/// happen as a single step even when many tasks register at once.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a storage error until switched back.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.offline = offline;
        }
    }

    /// Number of stored attendees.
    #[must_use]
    pub fn attendee_count(&self) -> usize {
        self.tables.lock().map_or(0, |t| t.attendees.len())
    }

    /// Number of stored registrations, optionally for one event.
    #[must_use]
    pub fn registration_count(&self, event_id: Option<EventId>) -> usize {
        self.tables.lock().map_or(0, |t| {
            t.registrations
                .iter()
                .filter(|r| event_id.is_none_or(|id| r.event_id == id))
                .count()
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| RegistrationError::Storage("in-memory store poisoned".to_string()))?;
        if tables.offline {
            return Err(RegistrationError::Storage("in-memory store offline".to_string()));
        }
        Ok(tables)
    }

    fn register_locked(
        &self,
        event_id: EventId,
        registrant: &Registrant,
        at: DateTime<Utc>,
    ) -> Result<Registration> {
        let mut tables = self.lock()?;

        let capacity = tables
            .events
            .get(&event_id)
            .map(|e| e.max_capacity)
            .ok_or(RegistrationError::EventNotFound)?;

        let existing = tables.attendees_by_email.get(&registrant.email).copied();

        if let Some(attendee_id) = existing {
            if tables
                .registrations
                .iter()
                .any(|r| r.event_id == event_id && r.attendee_id == attendee_id)
            {
                return Err(RegistrationError::DuplicateRegistration);
            }
        }

        let registered = tables
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .count();
        if capacity.is_reached_by(registered as u64) {
            return Err(RegistrationError::EventFull);
        }

        // A rejected registration leaves no new attendee behind.
        let attendee_id = existing.unwrap_or_else(|| {
            let attendee = Attendee {
                id: AttendeeId::new(),
                name: registrant.name.clone(),
                email: registrant.email.clone(),
            };
            let id = attendee.id;
            tables.attendees_by_email.insert(attendee.email.clone(), id);
            tables.attendees.insert(id, attendee);
            id
        });

        let registration = Registration {
            id: RegistrationId::new(),
            event_id,
            attendee_id,
            created_at: at,
        };
        tables.registrations.push(registration.clone());
        Ok(registration)
    }
}

impl EventCatalog for InMemoryStore {
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, Result<Event>> {
        Box::pin(async move {
            let event = Event::from_new(event);
            self.lock()?.events.insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn get_event(&self, id: EventId) -> BoxFuture<'_, Result<Option<Event>>> {
        Box::pin(async move { Ok(self.lock()?.events.get(&id).cloned()) })
    }

    fn list_upcoming(
        &self,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> BoxFuture<'_, Result<Page<Event>>> {
        Box::pin(async move {
            let mut events: Vec<Event> = self
                .lock()?
                .events
                .values()
                .filter(|e| e.is_upcoming(now))
                .cloned()
                .collect();
            events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
            Ok(Page::from_ordered(page, events))
        })
    }

    fn list_attendees(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> BoxFuture<'_, Result<Page<Attendee>>> {
        Box::pin(async move {
            let tables = self.lock()?;
            if !tables.events.contains_key(&event_id) {
                return Err(RegistrationError::EventNotFound);
            }

            let mut registrations: Vec<&Registration> = tables
                .registrations
                .iter()
                .filter(|r| r.event_id == event_id)
                .collect();
            registrations.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then(a.attendee_id.cmp(&b.attendee_id))
            });

            let attendees = registrations
                .into_iter()
                .filter_map(|r| tables.attendees.get(&r.attendee_id).cloned())
                .collect();
            Ok(Page::from_ordered(page, attendees))
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { self.lock().map(|_| ()) })
    }
}

impl RegistrationLedger for InMemoryStore {
    fn register<'a>(
        &'a self,
        event_id: EventId,
        registrant: &'a Registrant,
        at: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Registration>> {
        Box::pin(async move { self.register_locked(event_id, registrant, at) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Capacity;
    use chrono::{Duration, TimeZone};

    fn new_event(capacity: u32, start: DateTime<Utc>) -> NewEvent {
        NewEvent {
            name: "Meetup".into(),
            location: "Library".into(),
            start_time: start,
            end_time: start + Duration::hours(1),
            max_capacity: Capacity::new(capacity).unwrap(),
        }
    }

    fn registrant(name: &str, email: &str) -> Registrant {
        Registrant {
            name: name.into(),
            email: email.into(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn capacity_and_duplicates_enforced() {
        let store = InMemoryStore::new();
        let event = store.create_event(new_event(2, t0())).await.unwrap();

        let ada = registrant("Ada", "ada@example.com");
        store.register(event.id, &ada, t0()).await.unwrap();
        assert_eq!(
            store.register(event.id, &ada, t0()).await.unwrap_err(),
            RegistrationError::DuplicateRegistration
        );

        store
            .register(event.id, &registrant("Bob", "bob@example.com"), t0())
            .await
            .unwrap();
        assert_eq!(
            store
                .register(event.id, &registrant("Cy", "cy@example.com"), t0())
                .await
                .unwrap_err(),
            RegistrationError::EventFull
        );

        assert_eq!(store.registration_count(Some(event.id)), 2);
        assert_eq!(store.attendee_count(), 2);
    }

    #[tokio::test]
    async fn attendee_reused_across_events_and_name_kept() {
        let store = InMemoryStore::new();
        let first = store.create_event(new_event(5, t0())).await.unwrap();
        let second = store.create_event(new_event(5, t0())).await.unwrap();

        store
            .register(first.id, &registrant("Ada", "ada@example.com"), t0())
            .await
            .unwrap();
        store
            .register(second.id, &registrant("Ada Lovelace", "ada@example.com"), t0())
            .await
            .unwrap();

        assert_eq!(store.attendee_count(), 1);
        let page = store
            .list_attendees(second.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.results[0].name, "Ada");
    }

    #[tokio::test]
    async fn unknown_event() {
        let store = InMemoryStore::new();
        let missing = EventId::new();
        assert_eq!(
            store
                .register(missing, &registrant("Ada", "ada@example.com"), t0())
                .await
                .unwrap_err(),
            RegistrationError::EventNotFound
        );
        assert_eq!(
            store
                .list_attendees(missing, PageRequest::default())
                .await
                .unwrap_err(),
            RegistrationError::EventNotFound
        );
        assert_eq!(store.attendee_count(), 0);
    }

    #[tokio::test]
    async fn upcoming_sorted_and_past_hidden() {
        let store = InMemoryStore::new();
        store.create_event(new_event(1, t0() - Duration::days(1))).await.unwrap();
        let later = store.create_event(new_event(1, t0() + Duration::days(2))).await.unwrap();
        let sooner = store.create_event(new_event(1, t0() + Duration::days(1))).await.unwrap();
        let now = store.create_event(new_event(1, t0())).await.unwrap();

        let page = store.list_upcoming(t0(), PageRequest::default()).await.unwrap();
        let ids: Vec<EventId> = page.results.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![now.id, sooner.id, later.id]);
        assert_eq!(page.count, 3);
    }

    #[tokio::test]
    async fn attendees_most_recent_first() {
        let store = InMemoryStore::new();
        let event = store.create_event(new_event(5, t0())).await.unwrap();
        store
            .register(event.id, &registrant("Ada", "ada@example.com"), t0())
            .await
            .unwrap();
        store
            .register(
                event.id,
                &registrant("Bob", "bob@example.com"),
                t0() + Duration::minutes(1),
            )
            .await
            .unwrap();

        let page = store.list_attendees(event.id, PageRequest::default()).await.unwrap();
        let names: Vec<&str> = page.results.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Ada"]);
    }

    #[tokio::test]
    async fn concurrent_registrations_never_exceed_capacity() {
        let store = InMemoryStore::new();
        let event_id = store.create_event(new_event(5, t0())).await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let who = registrant("Guest", &format!("guest{i}@example.com"));
                store.register(event_id, &who, t0()).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert_eq!(err, RegistrationError::EventFull),
            }
        }

        assert_eq!(accepted, 5);
        assert_eq!(store.registration_count(Some(event_id)), 5);
    }

    #[tokio::test]
    async fn offline_store_fails_ping() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(matches!(store.ping().await, Err(RegistrationError::Storage(_))));
        store.set_offline(false);
        assert!(store.ping().await.is_ok());
    }
}
