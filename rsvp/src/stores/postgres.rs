//! `PostgreSQL` implementation of [`EventCatalog`] and [`RegistrationLedger`].
//!
//! Registration runs in a single transaction that locks the event row with
//! `SELECT .. FOR UPDATE`, so concurrent registrations for the same event are
//! serialized and the capacity check cannot be raced. Registrations for
//! different events never wait on each other.
//!
//! # Example
//!
//! ```ignore
//! use rsvp::stores::PostgresStore;
//!
//! let store = PostgresStore::connect(&config.database).await?;
//! store.migrate().await?;
//! ```

use crate::config::DatabaseConfig;
use crate::error::{RegistrationError, Result};
use crate::providers::{BoxFuture, EventCatalog, RegistrationLedger};
use crate::types::{
    Attendee, AttendeeId, Capacity, Event, EventId, NewEvent, Page, PageRequest, Registrant,
    Registration, RegistrationId,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

/// Postgres-backed event catalog and registration ledger.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    location: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    max_capacity: i32,
}

impl TryFrom<EventRow> for Event {
    type Error = RegistrationError;

    fn try_from(row: EventRow) -> Result<Self> {
        let max_capacity = u32::try_from(row.max_capacity)
            .ok()
            .and_then(Capacity::new)
            .ok_or_else(|| {
                RegistrationError::Storage(format!(
                    "event {} has invalid capacity {}",
                    row.id, row.max_capacity
                ))
            })?;

        Ok(Self {
            id: EventId::from_uuid(row.id),
            name: row.name,
            location: row.location,
            start_time: row.start_time,
            end_time: row.end_time,
            max_capacity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttendeeRow {
    id: Uuid,
    name: String,
    email: String,
}

impl From<AttendeeRow> for Attendee {
    fn from(row: AttendeeRow) -> Self {
        Self {
            id: AttendeeId::from_uuid(row.id),
            name: row.name,
            email: row.email,
        }
    }
}

fn sql_window(page: PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit()).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

fn row_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

impl PostgresStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Storage`] if the database cannot be reached.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| RegistrationError::Storage(format!("Failed to connect: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Create or upgrade the schema.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RegistrationError::Storage(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_event(&self, new_event: NewEvent) -> Result<Event> {
        let event = Event::from_new(new_event);
        let capacity = i32::try_from(event.max_capacity.value())
            .map_err(|e| RegistrationError::Storage(e.to_string()))?;

        sqlx::query(
            "INSERT INTO events (id, name, location, start_time, end_time, max_capacity)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(event.id.as_uuid())
        .bind(&event.name)
        .bind(&event.location)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(capacity)
        .execute(&self.pool)
        .await?;

        tracing::info!(event_id = %event.id, capacity = %event.max_capacity, "Event created");
        Ok(event)
    }

    async fn fetch_event(&self, id: EventId) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            "SELECT id, name, location, start_time, end_time, max_capacity
             FROM events WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    async fn fetch_upcoming(&self, now: DateTime<Utc>, page: PageRequest) -> Result<Page<Event>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE start_time >= $1")
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        let (limit, offset) = sql_window(page);
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT id, name, location, start_time, end_time, max_capacity
             FROM events
             WHERE start_time >= $1
             ORDER BY start_time ASC, id ASC
             LIMIT $2 OFFSET $3",
        )
        .bind(now)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let events = rows
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(page, row_count(count), events))
    }

    async fn fetch_attendees(&self, event_id: EventId, page: PageRequest) -> Result<Page<Attendee>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
            .bind(event_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(RegistrationError::EventNotFound);
        }

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(event_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        // (event_id, attendee_id) is unique, so the join yields each attendee once.
        let (limit, offset) = sql_window(page);
        let rows: Vec<AttendeeRow> = sqlx::query_as(
            "SELECT a.id, a.name, a.email
             FROM registrations r
             JOIN attendees a ON a.id = r.attendee_id
             WHERE r.event_id = $1
             ORDER BY r.created_at DESC, a.id ASC
             LIMIT $2 OFFSET $3",
        )
        .bind(event_id.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(
            page,
            row_count(count),
            rows.into_iter().map(Attendee::from).collect(),
        ))
    }

    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    async fn register_in_transaction(
        &self,
        event_id: EventId,
        registrant: &Registrant,
        at: DateTime<Utc>,
    ) -> Result<Registration> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes registrations per event until commit.
        let max_capacity: Option<i32> =
            sqlx::query_scalar("SELECT max_capacity FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(max_capacity) = max_capacity else {
            return Err(RegistrationError::EventNotFound);
        };

        let inserted: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO attendees (id, name, email, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO NOTHING
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&registrant.name)
        .bind(&registrant.email)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        let attendee_id = match inserted {
            Some(id) => id,
            None => {
                sqlx::query_scalar("SELECT id FROM attendees WHERE email = $1")
                    .bind(&registrant.email)
                    .fetch_one(&mut *tx)
                    .await?
            },
        };

        let already_registered: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM registrations WHERE event_id = $1 AND attendee_id = $2
             )",
        )
        .bind(event_id.as_uuid())
        .bind(attendee_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_registered {
            return Err(RegistrationError::DuplicateRegistration);
        }

        let registered: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(event_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if registered >= i64::from(max_capacity) {
            return Err(RegistrationError::EventFull);
        }

        let registration = Registration {
            id: RegistrationId::new(),
            event_id,
            attendee_id: AttendeeId::from_uuid(attendee_id),
            created_at: at,
        };

        sqlx::query(
            "INSERT INTO registrations (id, event_id, attendee_id, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(registration.id.as_uuid())
        .bind(event_id.as_uuid())
        .bind(attendee_id)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RegistrationError::DuplicateRegistration
            },
            other => RegistrationError::from(other),
        })?;

        tx.commit().await?;

        tracing::debug!(
            registration_id = %registration.id,
            attendee_id = %registration.attendee_id,
            "Registration committed"
        );
        Ok(registration)
    }
}

impl EventCatalog for PostgresStore {
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, Result<Event>> {
        Box::pin(self.insert_event(event))
    }

    fn get_event(&self, id: EventId) -> BoxFuture<'_, Result<Option<Event>>> {
        Box::pin(self.fetch_event(id))
    }

    fn list_upcoming(
        &self,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> BoxFuture<'_, Result<Page<Event>>> {
        Box::pin(self.fetch_upcoming(now, page))
    }

    fn list_attendees(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> BoxFuture<'_, Result<Page<Attendee>>> {
        Box::pin(self.fetch_attendees(event_id, page))
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
    }
}

impl RegistrationLedger for PostgresStore {
    fn register<'a>(
        &'a self,
        event_id: EventId,
        registrant: &'a Registrant,
        at: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Registration>> {
        Box::pin(self.register_in_transaction(event_id, registrant, at))
    }
}
