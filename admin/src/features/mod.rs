//! One feature per page: `State`, `Action` and `Reducer`
//!
//! Every reducer talks to the backend through [`PageEnvironment::backend`]
//! and turns each response into a follow-up action. Navigation is an action
//! too (`Navigate`), recorded in the page state as `redirect`; the 401 case
//! schedules it with a delay.
//!
//! [`PageEnvironment::backend`]: crate::environment::PageEnvironment::backend

pub mod dashboard;
pub mod door;
pub mod downloads;
pub mod event_creator;
pub mod event_editor;
pub mod pages;
pub mod public_events;
pub mod purchase;
pub mod session;
pub mod ticket_desk;

use elephant_client::{ApiError, BackendFuture};
use elephant_core::async_effect;
use elephant_core::effect::Effect;

/// Effect that awaits a backend call and feeds its result back as an action
pub(crate) fn request<T, A, F>(call: BackendFuture<T>, into_action: F) -> Effect<A>
where
    T: Send + 'static,
    A: Send + 'static,
    F: FnOnce(Result<T, ApiError>) -> A + Send + 'static,
{
    async_effect! {
        Some(into_action(call.await))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::environment::PageEnvironment;
    use crate::reports::MemoryReportSink;
    use elephant_testing::{MockBackend, test_clock};
    use std::sync::Arc;
    use std::time::Duration;

    /// Redirect delay used by reducer tests
    pub const REDIRECT: Duration = Duration::from_millis(1500);

    /// Environment over `backend` with the fixed test clock
    pub fn env(backend: &MockBackend) -> PageEnvironment {
        PageEnvironment::new(
            Arc::new(backend.clone()),
            Arc::new(test_clock()),
            Arc::new(MemoryReportSink::new()),
        )
    }
}
