//! Given-When-Then harness for reducers.
//!
//! A test names the environment, the starting state and one action, then
//! lists checks against the state and the effects the reducer returns. No
//! store is involved: effects are handed back untouched so the test decides
//! whether to drive them.

#![allow(clippy::module_name_repetitions)]

use rsvp_core::{effect::Effect, reducer::Reducer};
use smallvec::SmallVec;

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Reducer test builder.
///
/// ```ignore
/// ReducerTest::new(RegistrationReducer::new())
///     .with_env(environment)
///     .given_state(RegistrationState::default())
///     .when_action(register_command)
///     .then_state(|s| assert_eq!(s.in_flight.len(), 1))
///     .then_effects(assertions::assert_has_future_effect)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    env: Option<E>,
    state: Option<S>,
    action: Option<A>,
    state_checks: Vec<StateCheck<S>>,
    effect_checks: Vec<EffectCheck<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a test for `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            state: None,
            action: None,
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment passed to the reducer.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.env = Some(env);
        self
    }

    /// Given: the state before the action.
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    /// When: the action under test.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Then: a check on the state after the action.
    #[must_use]
    pub fn then_state(mut self, check: impl FnOnce(&S) + 'static) -> Self {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Then: a check on the returned effects.
    #[must_use]
    pub fn then_effects(mut self, check: impl FnOnce(&[Effect<A>]) + 'static) -> Self {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Run the reducer and every check.
    ///
    /// # Panics
    ///
    /// Panics if the environment, state or action is missing, or if a check fails.
    pub fn run(self) {
        drop(self.run_for_effects());
    }

    /// Like [`run`](Self::run) but hands back the effects, typically for
    /// [`collect_actions`](crate::collect_actions).
    ///
    /// # Panics
    ///
    /// Panics if the environment, state or action is missing, or if a check fails.
    #[allow(clippy::panic)]
    pub fn run_for_effects(self) -> SmallVec<[Effect<A>; 4]> {
        let (Some(env), Some(mut state), Some(action)) = (self.env, self.state, self.action) else {
            panic!("ReducerTest needs with_env(), given_state() and when_action() before running");
        };

        let effects = self.reducer.reduce(&mut state, action, &env);

        self.state_checks.into_iter().for_each(|check| check(&state));
        self.effect_checks.into_iter().for_each(|check| check(&effects));

        effects
    }
}

/// Effect assertions for `then_effects`.
pub mod assertions {
    use rsvp_core::effect::Effect;

    /// Every effect is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if any effect would do work.
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, found {effects:?}"
        );
    }

    /// Exactly `expected` effects were returned.
    ///
    /// # Panics
    ///
    /// Panics on a count mismatch.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {expected} effects, found {effects:?}"
        );
    }

    /// At least one effect is a future.
    ///
    /// # Panics
    ///
    /// Panics if none is.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected a Future effect, found {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[derive(Clone, Debug, PartialEq)]
    enum Seat {
        Take,
        Release,
        TakeLater,
    }

    struct SeatReducer;

    impl Reducer for SeatReducer {
        type State = u32;
        type Action = Seat;
        type Environment = u32;

        fn reduce(
            &self,
            taken: &mut u32,
            action: Seat,
            capacity: &u32,
        ) -> SmallVec<[Effect<Seat>; 4]> {
            match action {
                Seat::Take if *taken < *capacity => *taken += 1,
                Seat::Take => {},
                Seat::Release => *taken = taken.saturating_sub(1),
                Seat::TakeLater => {
                    return smallvec![Effect::Future(Box::pin(async { Some(Seat::Take) }))];
                },
            }
            smallvec![Effect::None]
        }
    }

    #[test]
    fn state_checks_see_the_new_state() {
        ReducerTest::new(SeatReducer)
            .with_env(2)
            .given_state(1)
            .when_action(Seat::Take)
            .then_state(|taken| assert_eq!(*taken, 2))
            .then_effects(assertions::assert_no_effects)
            .run();

        ReducerTest::new(SeatReducer)
            .with_env(2)
            .given_state(2)
            .when_action(Seat::Take)
            .then_state(|taken| assert_eq!(*taken, 2))
            .run();
    }

    #[test]
    fn release_never_underflows() {
        ReducerTest::new(SeatReducer)
            .with_env(2)
            .given_state(0)
            .when_action(Seat::Release)
            .then_state(|taken| assert_eq!(*taken, 0))
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    #[should_panic(expected = "ReducerTest needs")]
    fn missing_action_panics() {
        ReducerTest::new(SeatReducer).with_env(1).given_state(0).run();
    }

    #[tokio::test]
    async fn returned_effects_can_be_driven() {
        let effects = ReducerTest::new(SeatReducer)
            .with_env(2)
            .given_state(0)
            .when_action(Seat::TakeLater)
            .then_state(|taken| assert_eq!(*taken, 0))
            .then_effects(assertions::assert_has_future_effect)
            .run_for_effects();

        assert_eq!(crate::collect_actions(effects).await, vec![Seat::Take]);
    }
}
