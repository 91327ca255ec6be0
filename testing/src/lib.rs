//! # RSVP Testing
//!
//! Test support for reducer-based features:
//! - [`FixedClock`] and [`test_clock`] for deterministic timestamps
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - [`collect_actions`], which drives returned effects without a store

use chrono::{DateTime, Utc};
use rsvp_core::environment::Clock;

pub mod reducer_test;

/// Mock environment implementations.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::TimeZone;

    /// Clock that always reports the same instant.
    ///
    /// ```
    /// use rsvp_testing::mocks::FixedClock;
    /// use rsvp_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Clock pinned at `time`.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock pinned at 2025-01-01 00:00:00 UTC.
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    }
}

/// Running effects outside a store.
pub mod effects {
    use rsvp_core::effect::Effect;

    /// Await every future effect in order and collect the actions they yield.
    pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();
        for effect in effects {
            if let Effect::Future(fut) = effect {
                actions.extend(fut.await);
            }
        }
        actions
    }
}

pub use effects::collect_actions;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;
    use rsvp_core::effect::Effect;

    #[test]
    fn test_clock_is_new_year_2025() {
        assert_eq!(test_clock().now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn collect_actions_skips_empty_effects() {
        let effects = vec![
            Effect::None,
            Effect::Future(Box::pin(async { Some(1) })),
            Effect::Future(Box::pin(async { None })),
            Effect::Future(Box::pin(async { Some(3) })),
        ];

        assert_eq!(collect_actions(effects).await, vec![1, 3]);
    }
}
