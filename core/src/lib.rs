//! # RSVP Core
//!
//! Reducer, effect and environment abstractions.
//!
//! A feature is a reducer over its own state. The reducer mutates state in
//! place and hands back effect descriptions; the runtime executes them and
//! feeds whatever action they produce back into the same reducer.
//!
//! ```text
//! Action ──► reduce(&mut State, Action, &Environment) ──► [Effect]
//!   ▲                                                        │
//!   └──────────────── Effect::Future resolves ◄──────────────┘
//! ```
//!
//! Reducers never perform I/O themselves. Anything that touches the outside
//! world (a database, the clock) is reached through the environment and only
//! inside an effect.

pub use smallvec::{SmallVec, smallvec};

mod effect_macros;

/// The reducer trait.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Business logic for one feature.
    ///
    /// `reduce` must be deterministic given its inputs: validation, state
    /// transitions and the choice of effects all happen here, the effects
    /// themselves run later.
    pub trait Reducer {
        /// State owned by this reducer
        type State;

        /// Commands and the outcomes fed back by effects
        type Action;

        /// Injected dependencies
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work.
        ///
        /// Up to four effects stay inline without allocating.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect descriptions returned by reducers.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future an effect runs to completion.
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// A side effect for the runtime to execute.
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Async work; a `Some` result is fed back into the reducer
        Future(EffectFuture<Action>),
    }

    impl<Action> Effect<Action> {
        /// Whether executing this effect does nothing.
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }

    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::None => write!(f, "Effect::None"),
                Self::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }
}

/// Dependencies injected through a reducer's environment.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of the current time.
    ///
    /// Production code uses [`SystemClock`]; tests pin the time with a fixed
    /// clock so timestamps are deterministic.
    pub trait Clock: Send + Sync {
        /// Current instant
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};

    #[test]
    fn only_none_is_none() {
        let none: Effect<()> = Effect::None;
        let future: Effect<()> = Effect::Future(Box::pin(async { None }));

        assert!(none.is_none());
        assert!(!future.is_none());
    }

    #[test]
    fn debug_hides_future_body() {
        let effect: Effect<()> = Effect::Future(Box::pin(async { Some(()) }));
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
