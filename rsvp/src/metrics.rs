//! Business metrics for the registration service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `rsvp_registrations_total{outcome}` - Registration attempts by outcome
//! - `rsvp_events_created_total` - Events created
//!
//! ## Histograms
//! - `rsvp_registration_duration_seconds` - Time from request to outcome

use crate::error::RegistrationError;
use crate::types::Registration;
use metrics::{describe_counter, describe_histogram};
use std::time::Duration;

/// Register descriptions for every business metric.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "rsvp_registrations_total",
        "Registration attempts by outcome (registered, duplicate, full, event_not_found, invalid_input, storage, unavailable)"
    );
    describe_histogram!(
        "rsvp_registration_duration_seconds",
        "Time taken to register an attendee, including the wait for the outcome"
    );
    describe_counter!("rsvp_events_created_total", "Total number of events created");

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record the outcome of a registration attempt.
pub fn record_registration(
    outcome: &Result<Registration, RegistrationError>,
    elapsed: Duration,
) {
    let label = match outcome {
        Ok(_) => "registered",
        Err(err) => err.label(),
    };
    metrics::counter!("rsvp_registrations_total", "outcome" => label).increment(1);
    metrics::histogram!("rsvp_registration_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record an event creation.
pub fn record_event_created() {
    metrics::counter!("rsvp_events_created_total").increment(1);
}
