//! Door list: check-ins and walk-in counters for one event
//!
//! The event and its attendees are fetched once when the page opens. Every
//! later change merges the backend's answer into the loaded data instead of
//! refetching: a check-in toggle replaces one attendee's flag, a walk-in
//! adjustment replaces one counter.

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::page::{Loadable, PageError, Route, LOAD_FAILED_MESSAGE};
use crate::roster::{self, AttendeeGroup, DoorSummary};
use elephant_client::{
    ApiError, Attendee, AttendeeId, Event, EventId, PaymentType, WalkInAdjustment, WalkInCount,
};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};
use futures::FutureExt;

const CHECK_IN_FAILED: &str = "Failed to update check-in status. Please try again.";
const WALK_IN_FAILED: &str = "Failed to update walk-in count. Please try again.";

/// Event and door list as loaded
#[derive(Clone, Debug, PartialEq)]
pub struct DoorList {
    /// The event, carrying the walk-in counters
    pub event: Event,
    /// Every attendee of the event
    pub attendees: Vec<Attendee>,
}

/// Door page state
#[derive(Clone, Debug, PartialEq)]
pub struct DoorState {
    /// Event shown
    pub event_id: EventId,
    /// Loaded data
    pub list: Loadable<DoorList>,
    /// Search box
    pub search: String,
    /// Last success message
    pub notice: Option<String>,
    /// Last failed action
    pub error: Option<PageError>,
    /// Where the page wants to go
    pub redirect: Option<Route>,
}

impl DoorState {
    /// Page for one event, nothing loaded
    #[must_use]
    pub const fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            list: Loadable::Idle,
            search: String::new(),
            notice: None,
            error: None,
            redirect: None,
        }
    }

    /// Attendees matching the search, grouped by purchase
    #[must_use]
    pub fn groups(&self) -> Vec<AttendeeGroup<'_>> {
        self.list.value().map_or_else(Vec::new, |list| {
            roster::group_attendees(roster::filter_attendees(&list.attendees, &self.search))
        })
    }

    /// Totals over the whole list, ignoring the search
    #[must_use]
    pub fn summary(&self) -> Option<DoorSummary> {
        self.list
            .value()
            .map(|list| roster::summarize(&list.event, &list.attendees))
    }

    /// Current walk-in counters
    #[must_use]
    pub fn walk_ins(&self) -> WalkInCount {
        self.list
            .value()
            .map_or_else(WalkInCount::default, |list| list.event.walk_ins())
    }
}

/// Door page actions
#[derive(Clone, Debug)]
pub enum DoorAction {
    /// Fetch the event and its attendees
    Load,
    /// Both fetches finished
    Loaded {
        /// Event and attendees, or the first failure
        result: Result<(Event, Vec<Attendee>), ApiError>,
    },
    /// Type into the search box
    SetSearch(String),
    /// Flip one attendee's check-in
    ToggleCheckIn(AttendeeId),
    /// Backend answered a toggle
    CheckInToggled {
        /// Updated attendee
        result: Result<Attendee, ApiError>,
    },
    /// Add or remove one walk-in
    AdjustWalkIn {
        /// Counter to change
        payment_type: PaymentType,
        /// Up or down
        adjustment: WalkInAdjustment,
    },
    /// Backend answered a walk-in change
    WalkInAdjusted {
        /// Counter that was changed
        payment_type: PaymentType,
        /// Direction of the change
        adjustment: WalkInAdjustment,
        /// New counters
        result: Result<WalkInCount, ApiError>,
    },
    /// Refetch both walk-in counters
    RefreshWalkIns,
    /// Counters refetched
    WalkInsRefreshed {
        /// Current counters
        result: Result<WalkInCount, ApiError>,
    },
    /// Go somewhere else
    Navigate(Route),
}

/// Door page reducer
#[derive(Clone, Debug, Default)]
pub struct DoorReducer;

impl DoorReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn fail(
        state: &mut DoorState,
        error: PageError,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<DoorAction>; 4]> {
        let effect = error.follow_up(env.redirect_delay(), DoorAction::Navigate);
        state.error = Some(error);
        smallvec![effect]
    }
}

impl Reducer for DoorReducer {
    type State = DoorState;
    type Action = DoorAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut DoorState,
        action: DoorAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<DoorAction>; 4]> {
        match action {
            DoorAction::Load => {
                state.list = Loadable::Loading;
                state.error = None;

                let backend = env.backend();
                let event = backend.admin_event(state.event_id);
                let attendees = backend.event_attendees(state.event_id);
                smallvec![request(
                    futures::future::try_join(event, attendees).boxed(),
                    |result| DoorAction::Loaded { result },
                )]
            },

            DoorAction::Loaded { result } => match result {
                Ok((event, attendees)) => {
                    tracing::debug!(event_id = %event.id, attendees = attendees.len(), "Door list loaded");
                    state.list = Loadable::Loaded(DoorList { event, attendees });
                    smallvec![Effect::None]
                },
                Err(error) => {
                    let error = PageError::load(&error, LOAD_FAILED_MESSAGE);
                    let effect = error.follow_up(env.redirect_delay(), DoorAction::Navigate);
                    state.list = Loadable::Failed(error);
                    smallvec![effect]
                },
            },

            DoorAction::SetSearch(search) => {
                state.search = search;
                smallvec![Effect::None]
            },

            DoorAction::ToggleCheckIn(id) => {
                if !state.list.is_loaded() {
                    return smallvec![Effect::None];
                }
                state.notice = None;
                state.error = None;

                smallvec![request(env.backend().toggle_check_in(id), |result| {
                    DoorAction::CheckInToggled { result }
                })]
            },

            DoorAction::CheckInToggled { result } => match result {
                Ok(updated) => {
                    let Some(list) = state.list.value_mut() else {
                        return smallvec![Effect::None];
                    };
                    let mut name = updated.name.clone();
                    if let Some(attendee) = list.attendees.iter_mut().find(|a| a.id == updated.id) {
                        attendee.checked_in = updated.checked_in;
                        if name.is_empty() {
                            name.clone_from(&attendee.name);
                        }
                    }

                    let verb = if updated.checked_in { "checked in" } else { "checked out" };
                    tracing::info!(attendee_id = %updated.id, checked_in = updated.checked_in, "Check-in toggled");
                    state.notice = Some(format!("Successfully {verb} {name}"));
                    smallvec![Effect::None]
                },
                Err(error) => Self::fail(state, PageError::action(&error, CHECK_IN_FAILED), env),
            },

            DoorAction::AdjustWalkIn {
                payment_type,
                adjustment,
            } => {
                if !state.list.is_loaded() {
                    return smallvec![Effect::None];
                }
                if adjustment == WalkInAdjustment::Decrement && state.walk_ins().get(payment_type) == 0 {
                    return smallvec![Effect::None];
                }
                state.notice = None;
                state.error = None;

                let call = env
                    .backend()
                    .adjust_walk_in(state.event_id, payment_type, adjustment);
                smallvec![request(call, move |result| DoorAction::WalkInAdjusted {
                    payment_type,
                    adjustment,
                    result,
                })]
            },

            DoorAction::WalkInAdjusted {
                payment_type,
                adjustment,
                result,
            } => match result {
                Ok(counts) => {
                    if let Some(list) = state.list.value_mut() {
                        list.event.apply_walk_in(payment_type, counts);
                    }
                    let verb = match adjustment {
                        WalkInAdjustment::Increment => "incremented",
                        WalkInAdjustment::Decrement => "decremented",
                    };
                    state.notice = Some(format!("Successfully {verb} {payment_type} walk-in count"));
                    smallvec![Effect::None]
                },
                Err(error) => Self::fail(state, PageError::action(&error, WALK_IN_FAILED), env),
            },

            DoorAction::RefreshWalkIns => {
                if !state.list.is_loaded() {
                    return smallvec![Effect::None];
                }
                let call = env.backend().walk_in_counts(state.event_id);
                smallvec![request(call, |result| DoorAction::WalkInsRefreshed { result })]
            },

            DoorAction::WalkInsRefreshed { result } => match result {
                Ok(counts) => {
                    if let Some(list) = state.list.value_mut() {
                        list.event.apply_walk_in(PaymentType::Cash, counts);
                        list.event.apply_walk_in(PaymentType::Gcash, counts);
                    }
                    smallvec![Effect::None]
                },
                Err(error) => Self::fail(state, PageError::load(&error, LOAD_FAILED_MESSAGE), env),
            },

            DoorAction::Navigate(route) => {
                state.redirect = Some(route);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::features::test_support::{env, REDIRECT};
    use elephant_runtime::Store;
    use elephant_testing::{assertions, fixtures, Endpoint, MockBackend, ReducerTest};

    fn door_list() -> (Event, Vec<Attendee>) {
        let mut event = fixtures::event(5, "Elephant", "2025-06-20");
        event.walk_in_cash_count = 2;
        let attendees = vec![
            fixtures::attendee(1, "Bea", "Lance"),
            fixtures::attendee(2, "Lance", "Lance"),
            fixtures::attendee(3, "Mika", "Mika"),
        ];
        (event, attendees)
    }

    fn loaded() -> DoorAction {
        DoorAction::Loaded {
            result: Ok(door_list()),
        }
    }

    fn backend() -> MockBackend {
        let (event, attendees) = door_list();
        MockBackend::new()
            .with_events([event])
            .with_attendees(EventId(5), attendees)
    }

    #[test]
    fn test_loaded_list_is_grouped_buyer_first() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .when_action(loaded())
            .then_state(|state| {
                let groups = state.groups();
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].identifier, "Lance");
                assert_eq!(groups[0].members[0].name, "Lance");
                assert_eq!(groups[0].members[1].name, "Bea");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_search_matches_group_identifier() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .given_actions([loaded()])
            .when_action(DoorAction::SetSearch("lance".to_string()))
            .then_state(|state| {
                let groups = state.groups();
                assert_eq!(groups.len(), 1);
                assert_eq!(groups[0].members.len(), 2);
                assert_eq!(state.summary().unwrap().total_attendees, 3);
            })
            .run();
    }

    #[test]
    fn test_decrement_at_zero_issues_no_request() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .given_actions([loaded()])
            .when_action(DoorAction::AdjustWalkIn {
                payment_type: PaymentType::Gcash,
                adjustment: WalkInAdjustment::Decrement,
            })
            .then_state(|state| assert_eq!(state.walk_ins().gcash, 0))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_decrement_above_zero_requests() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .given_actions([loaded()])
            .when_action(DoorAction::AdjustWalkIn {
                payment_type: PaymentType::Cash,
                adjustment: WalkInAdjustment::Decrement,
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_walk_in_response_merges_one_counter() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .given_actions([loaded()])
            .when_action(DoorAction::WalkInAdjusted {
                payment_type: PaymentType::Gcash,
                adjustment: WalkInAdjustment::Increment,
                result: Ok(WalkInCount { cash: 40, gcash: 1 }),
            })
            .then_state(|state| {
                assert_eq!(state.walk_ins(), WalkInCount { cash: 2, gcash: 1 });
                assert_eq!(
                    state.notice.as_deref(),
                    Some("Successfully incremented gcash walk-in count")
                );
            })
            .run();
    }

    #[test]
    fn test_unauthorized_load_redirects_after_delay() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .when_action(DoorAction::Loaded {
                result: Err(ApiError::Unauthorized),
            })
            .then_state(|state| {
                assert_eq!(state.list.error(), Some(&PageError::AuthRequired));
                assert!(state.redirect.is_none());
            })
            .then_effects(|effects| {
                let action = assertions::assert_has_delay_effect(effects, REDIRECT);
                assert!(matches!(action, DoorAction::Navigate(Route::AdminLogin)));
            })
            .run();
    }

    #[test]
    fn test_failed_toggle_uses_fallback_message() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .given_actions([loaded()])
            .when_action(DoorAction::CheckInToggled {
                result: Err(ApiError::RequestFailed("connection reset".to_string())),
            })
            .then_state(|state| {
                assert_eq!(
                    state.error,
                    Some(PageError::Transport(CHECK_IN_FAILED.to_string()))
                );
            })
            .run();
    }

    #[tokio::test]
    async fn test_check_in_round_trip_through_store() {
        let backend = backend();
        let store = Store::new(DoorState::new(EventId(5)), DoorReducer::new(), env(&backend));

        store.send(DoorAction::Load).await.wait().await;
        store
            .send(DoorAction::ToggleCheckIn(AttendeeId(3)))
            .await
            .wait()
            .await;

        let (notice, checked_in) = store
            .state(|s| (s.notice.clone(), s.summary().map(|sum| sum.checked_in)))
            .await;
        assert_eq!(notice.as_deref(), Some("Successfully checked in Mika"));
        assert_eq!(checked_in, Some(1));
        assert_eq!(backend.call_count(Endpoint::EventAttendees), 1);
    }

    #[tokio::test]
    async fn test_walk_in_increment_through_store() {
        let backend = backend();
        let store = Store::new(DoorState::new(EventId(5)), DoorReducer::new(), env(&backend));

        store.send(DoorAction::Load).await.wait().await;
        store
            .send(DoorAction::AdjustWalkIn {
                payment_type: PaymentType::Cash,
                adjustment: WalkInAdjustment::Increment,
            })
            .await
            .wait()
            .await;

        assert_eq!(store.state(DoorState::walk_ins).await.cash, 3);
    }

    #[test]
    fn test_refreshed_walk_ins_replace_both_counters() {
        ReducerTest::new(DoorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DoorState::new(EventId(5)))
            .given_actions([loaded()])
            .when_action(DoorAction::WalkInsRefreshed {
                result: Ok(WalkInCount { cash: 4, gcash: 1 }),
            })
            .then_state(|state| {
                assert_eq!(state.walk_ins(), WalkInCount { cash: 4, gcash: 1 });
                assert!(state.notice.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_navigates_to_login() {
        let backend = backend();
        backend.fail_next(Endpoint::AdminEvent, ApiError::Unauthorized);
        let store = Store::new(DoorState::new(EventId(5)), DoorReducer::new(), env(&backend));

        store.send(DoorAction::Load).await.wait().await;

        let redirect = store.state(|s| s.redirect).await;
        assert_eq!(redirect, Some(Route::AdminLogin));
    }
}
