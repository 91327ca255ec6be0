//! Effect construction macros.

/// Build an [`Effect::Future`](crate::effect::Effect::Future) from an async
/// block body.
///
/// The body is moved into the future, so clone `Arc` dependencies out of the
/// environment first.
///
/// ```rust,ignore
/// let ledger = Arc::clone(&env.ledger);
/// async_effect! {
///     let outcome = ledger.register(event_id, &registrant, now).await;
///     Some(RegistrationAction::from_outcome(correlation_id, outcome))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;

    #[tokio::test]
    async fn async_effect_moves_captures() {
        let label = String::from("registered");
        let effect = async_effect! {
            Some(label.len())
        };

        let Effect::Future(fut) = effect else {
            unreachable!("async_effect! always builds a future");
        };
        assert_eq!(fut.await, Some(10));
    }
}
