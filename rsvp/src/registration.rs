//! Registration workflow.
//!
//! A registration request enters the [`RegistrationReducer`] as a `Register`
//! command. The reducer validates the input and hands valid requests to the
//! [`RegistrationLedger`] through an effect; the ledger's verdict comes back
//! as a terminal `Registered` or `RegistrationFailed` action tagged with the
//! request's correlation id. [`RegistrationService`] wraps the `Store` and
//! turns that round trip into a plain async call for HTTP handlers.

use crate::error::{RegistrationError, Result};
use crate::providers::RegistrationLedger;
use crate::types::{EventId, Registration};
use crate::validation::validate_registrant;
use rsvp_core::{SmallVec, async_effect, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use rsvp_runtime::{HealthCheck, Store, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

// ============================================================================
// State
// ============================================================================

/// Bookkeeping for registrations flowing through the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationState {
    /// Requests handed to the ledger and not yet answered, by correlation id
    pub in_flight: HashMap<Uuid, EventId>,
    /// Registrations accepted since startup
    pub completed: u64,
    /// Registrations rejected since startup (validation or business rule)
    pub rejected: u64,
    /// Most recent rejection
    pub last_error: Option<RegistrationError>,
}

// ============================================================================
// Actions
// ============================================================================

/// Registration commands and the events they produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationAction {
    /// Register an attendee for an event (command)
    Register {
        /// Ties the outcome back to the caller
        correlation_id: Uuid,
        /// Event to register for
        event_id: EventId,
        /// Raw attendee name
        name: String,
        /// Raw attendee email
        email: String,
    },

    /// Registration was stored (event)
    Registered {
        /// Correlation id of the originating command
        correlation_id: Uuid,
        /// Stored registration
        registration: Registration,
    },

    /// Registration was rejected (event)
    RegistrationFailed {
        /// Correlation id of the originating command
        correlation_id: Uuid,
        /// Reason
        error: RegistrationError,
    },
}

impl RegistrationAction {
    /// Correlation id carried by every variant.
    #[must_use]
    pub const fn correlation_id(&self) -> Uuid {
        match self {
            Self::Register { correlation_id, .. }
            | Self::Registered { correlation_id, .. }
            | Self::RegistrationFailed { correlation_id, .. } => *correlation_id,
        }
    }

    /// Whether this action ends a registration.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Registered { .. } | Self::RegistrationFailed { .. }
        )
    }

    /// Build the terminal action for a ledger outcome.
    #[must_use]
    pub fn from_outcome(correlation_id: Uuid, outcome: Result<Registration>) -> Self {
        match outcome {
            Ok(registration) => Self::Registered {
                correlation_id,
                registration,
            },
            Err(error) => Self::RegistrationFailed {
                correlation_id,
                error,
            },
        }
    }

    /// Unwrap a terminal action into the caller-facing result.
    ///
    /// # Errors
    ///
    /// Returns the carried error for `RegistrationFailed`, and
    /// [`RegistrationError::Unavailable`] for a non-terminal action.
    pub fn into_outcome(self) -> Result<Registration> {
        match self {
            Self::Registered { registration, .. } => Ok(registration),
            Self::RegistrationFailed { error, .. } => Err(error),
            Self::Register { .. } => Err(RegistrationError::Unavailable(
                "registration did not complete".to_string(),
            )),
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the registration reducer.
#[derive(Clone)]
pub struct RegistrationEnvironment {
    /// Atomic registration store
    pub ledger: Arc<dyn RegistrationLedger>,
    /// Registration timestamps
    pub clock: Arc<dyn Clock>,
}

impl RegistrationEnvironment {
    /// Creates a new `RegistrationEnvironment`
    #[must_use]
    pub fn new(ledger: Arc<dyn RegistrationLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for registration commands.
#[derive(Clone, Debug, Default)]
pub struct RegistrationReducer;

impl RegistrationReducer {
    /// Creates a new `RegistrationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for RegistrationReducer {
    type State = RegistrationState;
    type Action = RegistrationAction;
    type Environment = RegistrationEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            RegistrationAction::Register {
                correlation_id,
                event_id,
                name,
                email,
            } => {
                let registrant = match validate_registrant(&name, &email) {
                    Ok(registrant) => registrant,
                    Err(error) => {
                        tracing::debug!(%correlation_id, %event_id, %error, "Registration input rejected");
                        return smallvec![async_effect! {
                            Some(RegistrationAction::RegistrationFailed { correlation_id, error })
                        }];
                    },
                };

                state.in_flight.insert(correlation_id, event_id);

                let ledger = Arc::clone(&env.ledger);
                let now = env.clock.now();
                smallvec![async_effect! {
                    let outcome = ledger.register(event_id, &registrant, now).await;
                    Some(RegistrationAction::from_outcome(correlation_id, outcome))
                }]
            },

            // ========== Events ==========
            RegistrationAction::Registered {
                correlation_id,
                registration,
            } => {
                state.in_flight.remove(&correlation_id);
                state.completed += 1;
                tracing::info!(
                    %correlation_id,
                    event_id = %registration.event_id,
                    attendee_id = %registration.attendee_id,
                    "Attendee registered"
                );
                smallvec![Effect::None]
            },

            RegistrationAction::RegistrationFailed {
                correlation_id,
                error,
            } => {
                state.in_flight.remove(&correlation_id);
                state.rejected += 1;
                tracing::info!(%correlation_id, reason = error.label(), "Registration rejected");
                state.last_error = Some(error);
                smallvec![Effect::None]
            },
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Store running the registration reducer.
pub type RegistrationStore =
    Store<RegistrationState, RegistrationAction, RegistrationEnvironment, RegistrationReducer>;

/// Counters exposed for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RegistrationStats {
    /// Requests awaiting the ledger
    pub in_flight: usize,
    /// Accepted registrations
    pub completed: u64,
    /// Rejected registrations
    pub rejected: u64,
}

/// Request/response facade over the registration store.
#[derive(Clone)]
pub struct RegistrationService {
    store: RegistrationStore,
    timeout: Duration,
}

impl RegistrationService {
    /// Build the store and wrap it.
    #[must_use]
    pub fn new(ledger: Arc<dyn RegistrationLedger>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        let store = Store::new(
            RegistrationState::default(),
            RegistrationReducer::new(),
            RegistrationEnvironment::new(ledger, clock),
        );
        Self { store, timeout }
    }

    /// Register an attendee and wait for the outcome.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when the name or email fails validation
    /// - `EventNotFound`, `DuplicateRegistration` or `EventFull` from the ledger
    /// - `Unavailable` when no outcome arrives within the configured timeout or
    ///   the store is shutting down
    pub async fn register(
        &self,
        event_id: EventId,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Registration> {
        let correlation_id = Uuid::new_v4();
        let started = Instant::now();

        let outcome = self
            .store
            .send_and_wait_for(
                RegistrationAction::Register {
                    correlation_id,
                    event_id,
                    name: name.into(),
                    email: email.into(),
                },
                move |action| action.is_terminal() && action.correlation_id() == correlation_id,
                self.timeout,
            )
            .await
            .map_err(|err| {
                tracing::warn!(%correlation_id, %event_id, error = %err, "Registration did not complete");
                RegistrationError::from(err)
            })
            .and_then(RegistrationAction::into_outcome);

        crate::metrics::record_registration(&outcome, started.elapsed());
        outcome
    }

    /// Store health for readiness probes.
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        self.store.health()
    }

    /// Current counters.
    pub async fn stats(&self) -> RegistrationStats {
        self.store
            .state(|s| RegistrationStats {
                in_flight: s.in_flight.len(),
                completed: s.completed,
                rejected: s.rejected,
            })
            .await
    }

    /// Stop accepting registrations and wait for in-flight ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> std::result::Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}
