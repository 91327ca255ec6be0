//! # RSVP Runtime
//!
//! The [`Store`] runs a reducer: it owns the state, serializes actions through
//! the reducer and executes the effects the reducer returns. Actions produced
//! by effects are reduced like any other action and then handed to whichever
//! caller is waiting for it, so a request handler can send a command and wait
//! for the action that answers it.
//!
//! ```ignore
//! use rsvp_runtime::Store;
//!
//! let store = Store::new(
//!     RegistrationState::default(),
//!     RegistrationReducer::new(),
//!     environment,
//! );
//!
//! let outcome = store
//!     .send_and_wait_for(command, |a| a.is_terminal(), Duration::from_secs(5))
//!     .await?;
//! let completed = store.state(|s| s.completed).await;
//! ```

use rsvp_core::{effect::Effect, reducer::Reducer};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Prometheus recorder and store metric descriptions
pub mod metrics;

/// Store errors
pub mod error {
    use thiserror::Error;

    /// Errors returned by [`Store`](crate::Store) operations.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store no longer accepts actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when the shutdown deadline passed
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching action arrived in time
        #[error("Timeout waiting for action")]
        Timeout,

        /// The store dropped a waiting caller without an answer
        #[error("Store dropped the waiting caller")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Health status levels, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,

    /// Operational but under pressure
    Degraded,

    /// Not operational
    Unhealthy,
}

impl HealthStatus {
    /// `true` for [`HealthStatus::Healthy`].
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// `true` for [`HealthStatus::Unhealthy`].
    #[must_use]
    pub const fn is_unhealthy(self) -> bool {
        matches!(self, Self::Unhealthy)
    }

    /// The worse of two statuses.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Lowercase label, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of one component, as reported to readiness probes.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Component name (`store`, `database`, ..)
    pub component: String,

    /// Current status
    pub status: HealthStatus,

    /// Why the component is not healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Extra detail such as pending effect counts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<(String, String)>,
}

impl HealthCheck {
    fn with_status(
        component: impl Into<String>,
        status: HealthStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            component: component.into(),
            status,
            message,
            metadata: Vec::new(),
        }
    }

    /// Healthy component.
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self::with_status(component, HealthStatus::Healthy, None)
    }

    /// Degraded component.
    #[must_use]
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(component, HealthStatus::Degraded, Some(message.into()))
    }

    /// Unhealthy component.
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(component, HealthStatus::Unhealthy, Some(message.into()))
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Decrements the pending-effect counter when an effect task ends, panics included.
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The store.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicU64, AtomicUsize, Duration, Effect, HealthCheck, Ordering,
        PendingGuard, Reducer, RwLock, StoreError,
    };
    use std::sync::{Mutex, PoisonError};
    use tokio::sync::oneshot;

    /// Pending effect count above which the store reports itself degraded.
    const DEGRADED_PENDING_EFFECTS: usize = 1_000;

    /// Interval at which shutdown re-checks the pending effect count.
    const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

    type Predicate<A> = Box<dyn Fn(&A) -> bool + Send>;

    /// A caller of `send_and_wait_for` parked until a matching action is reduced.
    struct Waiter<A> {
        id: u64,
        predicate: Predicate<A>,
        sender: oneshot::Sender<A>,
    }

    /// Callers waiting for effect-produced actions.
    ///
    /// Each waiter gets its answer over its own channel, so a burst of
    /// unrelated answers never displaces it.
    struct Waiters<A> {
        next_id: AtomicU64,
        parked: Mutex<Vec<Waiter<A>>>,
    }

    impl<A> Waiters<A> {
        fn new() -> Self {
            Self {
                next_id: AtomicU64::new(0),
                parked: Mutex::new(Vec::new()),
            }
        }

        fn park(&self, predicate: Predicate<A>) -> (u64, oneshot::Receiver<A>) {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (sender, receiver) = oneshot::channel();
            self.parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Waiter {
                    id,
                    predicate,
                    sender,
                });
            (id, receiver)
        }

        fn forget(&self, id: u64) {
            self.parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|w| w.id != id);
        }

        /// Hand `action` to the first waiter whose predicate accepts it.
        fn deliver(&self, action: A) {
            let waiter = {
                let mut parked = self.parked.lock().unwrap_or_else(PoisonError::into_inner);
                parked
                    .iter()
                    .position(|w| (w.predicate)(&action))
                    .map(|index| parked.swap_remove(index))
            };

            if let Some(waiter) = waiter {
                if waiter.sender.send(action).is_err() {
                    tracing::debug!(waiter = waiter.id, "Waiter gone before its answer arrived");
                }
            }
        }

        fn len(&self) -> usize {
            self.parked.lock().unwrap_or_else(PoisonError::into_inner).len()
        }
    }

    /// Runtime coordinator for one reducer.
    ///
    /// - State sits behind an `RwLock`; the reducer runs under the write lock,
    ///   so concurrent `send` calls serialize at the reducer.
    /// - Effects run on spawned tasks and may finish in any order.
    /// - Every action an effect produces is reduced first and only then handed
    ///   to a waiting caller.
    ///
    /// Cloning is cheap and every clone drives the same state.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        waiters: Arc<Waiters<A>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a store around `initial_state`.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                waiters: Arc::new(Waiters::new()),
            }
        }

        /// Store health.
        ///
        /// Unhealthy once shutdown has begun, degraded when the number of
        /// running effects passes a fixed threshold.
        #[must_use]
        pub fn health(&self) -> HealthCheck {
            let pending = self.pending_effects.load(Ordering::Acquire);

            let check = if self.shutdown.load(Ordering::Acquire) {
                HealthCheck::unhealthy("store", "Store is shutting down")
            } else if pending > DEGRADED_PENDING_EFFECTS {
                HealthCheck::degraded("store", format!("{pending} effects pending"))
            } else {
                HealthCheck::healthy("store")
            };

            check
                .with_metadata("pending_effects", pending.to_string())
                .with_metadata("waiting_callers", self.waiters.len().to_string())
        }
        /// Stop accepting actions and wait for running effects to finish.
        ///
        /// Actions fed back by effects that are still running are rejected
        /// too; those effects are counted as finished once their task ends.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// after `timeout`.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!(timeout_ms = timeout.as_millis(), "Store shutting down");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);
            let deadline = tokio::time::Instant::now() + timeout;

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("Store drained");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if tokio::time::Instant::now() >= deadline {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(pending_effects = pending, "Waiting for effects to complete");
                tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
            }
        }

        /// Reduce `action` and start the effects it returns.
        ///
        /// Returns once the reducer has run; effects continue in the
        /// background.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Action rejected during shutdown");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                let started = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                effects
            };

            tracing::trace!(effects = effects.len(), "Reducer completed");
            for effect in effects {
                self.execute_effect(effect);
            }

            Ok(())
        }

        /// Send `action` and wait for the first effect-produced action that
        /// matches `predicate`.
        ///
        /// The caller is parked before the action is sent, so a fast effect
        /// cannot slip its answer past it. The initial action itself is never
        /// delivered. Each matching action answers exactly one caller; callers
        /// running side by side tell their answers apart through a correlation
        /// id carried in the action.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`]: store is shutting down
        /// - [`StoreError::Timeout`]: nothing matched within `timeout`
        /// - [`StoreError::ChannelClosed`]: the store dropped the caller
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool + Send + 'static,
        {
            let (id, answer) = self.waiters.park(Box::new(predicate));

            if let Err(error) = self.send(action).await {
                self.waiters.forget(id);
                return Err(error);
            }

            match tokio::time::timeout(timeout, answer).await {
                Ok(Ok(action)) => Ok(action),
                Ok(Err(_)) => Err(StoreError::ChannelClosed),
                Err(_) => {
                    self.waiters.forget(id);
                    Err(StoreError::Timeout)
                },
            }
        }

        /// Read current state via a closure.
        ///
        /// ```ignore
        /// let in_flight = store.state(|s| s.in_flight.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        fn execute_effect(&self, effect: Effect<A>) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                    let pending = PendingGuard::enter(&self.pending_effects);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _pending = pending;

                        if let Some(action) = fut.await {
                            if let Err(error) = store.send(action.clone()).await {
                                tracing::warn!(%error, "Feedback action rejected");
                            }
                            // Waiters only see an action once state reflects it.
                            store.waiters.deliver(action);
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                waiters: Arc::clone(&self.waiters),
            }
        }
    }
}

pub use store::Store;
