//! RSVP - event registration service
//!
//! Organizers publish events with a fixed capacity; attendees register by
//! name and email. The one operation with real concurrency concerns is
//! registration: for any event, confirmed registrations never exceed its
//! capacity and an attendee holds at most one registration per event, no
//! matter how many requests race.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)
//!      │
//!      ├── POST /events, GET /events, GET /events/:id/attendees
//!      │        └──────────────► EventCatalog ─────┐
//!      │                                           │
//!      └── POST /events/:id/register               ▼
//!               │                           PostgresStore
//!               ▼                           (or InMemoryStore)
//!       RegistrationService                        ▲
//!               │ Register                         │
//!               ▼                                  │
//!     Store<RegistrationReducer> ── effect ──► RegistrationLedger
//!               ▲                                  │
//!               └──── Registered / RegistrationFailed
//! ```
//!
//! # Registration
//!
//! The ledger performs every check and the insert as one atomic unit:
//!
//! ```text
//! lock event row            (absent → EventNotFound)
//! find or create attendee   (by lowercased email)
//! already registered?       → DuplicateRegistration
//! count >= max_capacity?    → EventFull
//! insert registration
//! ```
//!
//! Postgres takes a `FOR UPDATE` lock on the event row, so concurrent
//! registrations for one event serialize while other events proceed.
//!
//! # Timezones
//!
//! Callers name their zone in the `Timezone` header (default
//! `Asia/Kolkata`). Naive datetimes in requests are read in that zone and
//! every instant in a response is rendered in it as `DD/MM/YYYY hh:mm AM/PM`.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
pub mod providers;
pub mod registration;
pub mod server;
pub mod stores;
pub mod timezone;
pub mod types;
pub mod validation;

// Re-export key types for convenience
pub use config::Config;
pub use error::{RegistrationError, Result};
pub use providers::{EventCatalog, RegistrationLedger};
pub use registration::{RegistrationAction, RegistrationReducer, RegistrationService};
pub use server::{AppState, build_router};
pub use stores::PostgresStore;
pub use types::{Attendee, Capacity, Event, EventId, Page, PageRequest, Registration};
