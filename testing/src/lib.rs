//! # Elephant Testing
//!
//! Testing utilities and helpers for the Elephant Party client.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (`FixedClock`, `MockBackend`)
//! - A fluent reducer test harness with effect assertions
//! - Fixtures for events, tickets and attendees
//!
//! ## Example
//!
//! ```ignore
//! use elephant_testing::{MockBackend, fixtures, test_clock};
//! use elephant_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_door_loads() {
//!     let backend = MockBackend::new().with_events([fixtures::event(1, "Elephant", "2025-07-05")]);
//!     let store = Store::new(DoorState::new(EventId(1)), DoorReducer::new(), env(backend));
//!
//!     store.send(DoorAction::Load).await.wait().await;
//!
//!     let loaded = store.state(|s| s.event.is_loaded()).await;
//!     assert!(loaded);
//! }
//! ```

use chrono::{DateTime, Utc};
use elephant_core::environment::Clock;

pub mod backend;
pub mod fixtures;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use elephant_testing::mocks::FixedClock;
    /// use elephant_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
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

    /// Create a default fixed clock for tests (2025-06-15 12:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-15T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use backend::{BackendCall, Endpoint, MockBackend};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1, fixtures::timestamp("2025-06-15T12:00:00Z"));
    }
}
