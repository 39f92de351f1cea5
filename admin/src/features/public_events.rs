//! Public event listing with a featured slot and pagination

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::listing::{self, EventPage, DEFAULT_PAGE_SIZE};
use crate::page::{Loadable, PageError, LOAD_FAILED_MESSAGE};
use chrono::NaiveDateTime;
use elephant_client::{ApiError, Event};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};

/// Listing state
#[derive(Clone, Debug, PartialEq)]
pub struct ListingState {
    /// Every event, upcoming first
    pub events: Loadable<Vec<Event>>,
    /// Requested page (1-based)
    pub page: usize,
    /// Events per page
    pub page_size: usize,
    /// Local time the events were ordered against
    pub now: Option<NaiveDateTime>,
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListingState {
    /// Empty listing showing `page_size` events per page
    #[must_use]
    pub const fn new(page_size: usize) -> Self {
        Self {
            events: Loadable::Idle,
            page: 1,
            page_size,
            now: None,
        }
    }

    /// The current page, once events are loaded
    #[must_use]
    pub fn current(&self) -> Option<EventPage> {
        let events = self.events.value()?;
        let now = self.now?;
        Some(listing::paginate(events, self.page, self.page_size, now))
    }

    fn total_pages(&self) -> usize {
        self.current().map_or(1, |page| page.total_pages)
    }
}

/// Listing actions
#[derive(Clone, Debug)]
pub enum ListingAction {
    /// Fetch every public event
    Load,
    /// Events fetched
    Loaded {
        /// Events in backend order
        result: Result<Vec<Event>, ApiError>,
    },
    /// Jump to a page (clamped)
    GoToPage(usize),
    /// One page forward
    NextPage,
    /// One page back
    PreviousPage,
}

/// Listing reducer
#[derive(Clone, Debug, Default)]
pub struct ListingReducer;

impl ListingReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ListingReducer {
    type State = ListingState;
    type Action = ListingAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut ListingState,
        action: ListingAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<ListingAction>; 4]> {
        match action {
            ListingAction::Load => {
                state.events = Loadable::Loading;
                smallvec![request(env.backend().public_events(), |result| {
                    ListingAction::Loaded { result }
                })]
            },
            ListingAction::Loaded { result } => {
                state.events = match result {
                    Ok(events) => {
                        let now = env.local_now();
                        state.now = Some(now);
                        Loadable::Loaded(listing::order_events(events, now))
                    },
                    Err(error) => Loadable::Failed(PageError::load(&error, LOAD_FAILED_MESSAGE)),
                };
                state.page = state.page.clamp(1, state.total_pages());
                smallvec![Effect::None]
            },
            ListingAction::GoToPage(page) => {
                state.page = page.clamp(1, state.total_pages());
                smallvec![Effect::None]
            },
            ListingAction::NextPage => {
                state.page = (state.page + 1).min(state.total_pages());
                smallvec![Effect::None]
            },
            ListingAction::PreviousPage => {
                state.page = state.page.saturating_sub(1).max(1);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::features::test_support::env;
    use elephant_client::EventId;
    use elephant_runtime::Store;
    use elephant_testing::{fixtures, MockBackend, ReducerTest};

    /// Seven events around the test clock's 2025-06-15
    fn seven_events() -> Vec<Event> {
        vec![
            fixtures::event(1, "Past A", "2025-05-01"),
            fixtures::event(2, "Soonest", "2025-06-20"),
            fixtures::event(3, "Later", "2025-08-01"),
            fixtures::event(4, "Past B", "2025-06-01"),
            fixtures::event(5, "Today", "2025-06-15"),
            fixtures::event(6, "Past C", "2024-12-31"),
            fixtures::event(7, "Middle", "2025-07-01"),
        ]
    }

    fn ids(events: &[Event]) -> Vec<u64> {
        events.iter().map(|e| e.id.get()).collect()
    }

    #[test]
    fn test_loaded_events_are_ordered_and_featured() {
        ReducerTest::new(ListingReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(ListingState::new(6))
            .when_action(ListingAction::Loaded {
                result: Ok(seven_events()),
            })
            .then_state(|state| {
                let page = state.current().unwrap();
                assert_eq!(page.total_pages, 2);
                assert_eq!(page.featured.unwrap().id, EventId(2));
                assert_eq!(ids(&page.events), [7, 3, 5, 4, 1]);
            })
            .run();
    }

    #[test]
    fn test_page_navigation_is_clamped() {
        ReducerTest::new(ListingReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(ListingState::new(6))
            .given_actions([
                ListingAction::Loaded {
                    result: Ok(seven_events()),
                },
                ListingAction::GoToPage(9),
                ListingAction::NextPage,
            ])
            .when_action(ListingAction::PreviousPage)
            .then_state(|state| assert_eq!(state.page, 1))
            .run();

        ReducerTest::new(ListingReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(ListingState::new(6))
            .given_actions([ListingAction::Loaded {
                result: Ok(seven_events()),
            }])
            .when_action(ListingAction::GoToPage(9))
            .then_state(|state| {
                let page = state.current().unwrap();
                assert_eq!(page.page, 2);
                assert!(page.featured.is_none());
                assert_eq!(ids(&page.events), [6]);
            })
            .run();
    }

    #[test]
    fn test_failed_load_is_reported() {
        ReducerTest::new(ListingReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(ListingState::default())
            .when_action(ListingAction::Loaded {
                result: Err(ApiError::RequestFailed("refused".to_string())),
            })
            .then_state(|state| {
                assert_eq!(
                    state.events.error(),
                    Some(&PageError::Transport(LOAD_FAILED_MESSAGE.to_string()))
                );
                assert!(state.current().is_none());
            })
            .run();
    }

    #[tokio::test]
    async fn test_listing_loads_through_store() {
        let backend = MockBackend::new().with_events(seven_events());
        let store = Store::new(ListingState::new(3), ListingReducer::new(), env(&backend));

        store.send(ListingAction::Load).await.wait().await;

        let page = store.state(ListingState::current).await.unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(ids(&page.events), [2, 7]);
    }
}
