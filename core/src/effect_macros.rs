//! Declarative macros for ergonomic effect construction
//!
//! Feature reducers build most of their effects from a backend call whose
//! result is fed back as an action, or from a delayed navigation. These
//! macros keep that boilerplate out of the reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use elephant_core::async_effect;
///
/// async_effect! {
///     let result = backend.event(id).await;
///     Some(EditorAction::EventLoaded { result })
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

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use elephant_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_millis(1500),
///     action: DoorAction::Navigate(Route::AdminLogin)
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        Loaded { value: i32 },
        RedirectToLogin,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Loaded { value: 42 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_async_effect_yields_action() {
        let effect = async_effect! {
            Some(TestAction::Loaded { value: 7 })
        };

        let Effect::Future(fut) = effect else {
            unreachable!("async_effect! always builds a future");
        };
        let action = tokio_test::block_on(fut);
        assert!(matches!(action, Some(TestAction::Loaded { value: 7 })));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_millis(1500),
            action: TestAction::RedirectToLogin
        };

        match effect {
            Effect::Delay { duration, action } => {
                assert_eq!(duration, Duration::from_millis(1500));
                assert!(matches!(*action, TestAction::RedirectToLogin));
            }
            other => unreachable!("expected delay, got {other:?}"),
        }
    }
}
