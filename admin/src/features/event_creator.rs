//! New event page
//!
//! Only a title and a start date are asked for. Everything else starts from
//! placeholder defaults and is filled in later through the editor; the email
//! template and inactive message carry over from the most recent event so a
//! new night reads like the last one.

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::field_errors::FieldErrors;
use crate::page::{Loadable, PageError, Route, EVENT_LOAD_FAILED_MESSAGE};
use chrono::{Days, NaiveDate};
use elephant_client::{ApiError, Event, EventDraft, Upload};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};

const CREATE_FAILED: &str = "Failed to create event. Please try again.";

/// Days between creation and the default ticket deadline
pub const DEADLINE_DAYS: u64 = 30;

const DEFAULT_EMAIL_TEMPLATE: &str = "Thank you for your purchase!";
const DEFAULT_INACTIVE_MESSAGE: &str = "This event is not currently active.";

/// Draft for a brand-new event
///
/// New events start inactive so nothing goes on sale before the details
/// are filled in.
#[must_use]
pub fn new_event_draft(
    title: &str,
    start_date: NaiveDate,
    today: NaiveDate,
    latest: Option<&Event>,
) -> EventDraft {
    let deadline = today
        .checked_add_days(Days::new(DEADLINE_DAYS))
        .unwrap_or(today);
    let email_template_content = latest
        .map(|e| e.email_template_content.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_EMAIL_TEMPLATE.to_string());
    let inactive_message = latest
        .and_then(|e| e.inactive_message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_INACTIVE_MESSAGE.to_string());

    EventDraft {
        title: title.trim().to_string(),
        display_date: "Date to be announced".to_string(),
        venue_name: "Venue to be announced".to_string(),
        venue_address: "Address to be announced".to_string(),
        event_time: "Time to be announced".to_string(),
        description: "Event description to be added".to_string(),
        email_template_content,
        ticket_price_regular: 100.0,
        ticket_price_bundle: Some(80.0),
        bundle_size: Some(2),
        max_tickets: 100,
        ticket_deadline: deadline.format("%Y-%m-%d").to_string(),
        is_active: false,
        inactive_message: Some(inactive_message),
        start_date,
        walk_in_price: 120.0,
    }
}

/// Most recent event by start date
fn most_recent(events: Vec<Event>) -> Option<Event> {
    events.into_iter().max_by_key(|e| e.start_date)
}

/// New event page state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventCreatorState {
    /// Event whose template carries over (`None` when there are no events)
    pub latest: Loadable<Option<Event>>,
    /// Title input
    pub title: String,
    /// Start date input
    pub start_date: Option<NaiveDate>,
    /// Poster to upload with the event
    pub poster: Option<Upload>,
    /// Create is in flight
    pub submitting: bool,
    /// Last failure
    pub error: Option<PageError>,
    /// Where the page wants to go
    pub redirect: Option<Route>,
}

/// New event page actions
#[derive(Clone, Debug)]
pub enum EventCreatorAction {
    /// Fetch existing events to find the latest
    Load,
    /// Existing events fetched
    Loaded {
        /// All events
        result: Result<Vec<Event>, ApiError>,
    },
    /// Title input changed
    SetTitle(String),
    /// Start date input changed
    SetStartDate(NaiveDate),
    /// Poster chosen
    SetPoster(Upload),
    /// Create the event
    Submit,
    /// Backend answered the create
    Created {
        /// The new event
        result: Result<Event, ApiError>,
    },
    /// Go somewhere else
    Navigate(Route),
}

/// New event page reducer
#[derive(Clone, Debug, Default)]
pub struct EventCreatorReducer;

impl EventCreatorReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for EventCreatorReducer {
    type State = EventCreatorState;
    type Action = EventCreatorAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut EventCreatorState,
        action: EventCreatorAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<EventCreatorAction>; 4]> {
        match action {
            EventCreatorAction::Load => {
                state.latest = Loadable::Loading;
                smallvec![request(env.backend().admin_events(), |result| {
                    EventCreatorAction::Loaded { result }
                })]
            },

            EventCreatorAction::Loaded { result } => match result {
                Ok(events) => {
                    state.latest = Loadable::Loaded(most_recent(events));
                    smallvec![Effect::None]
                },
                Err(error) => {
                    let error = PageError::load(&error, EVENT_LOAD_FAILED_MESSAGE);
                    let effect = error.follow_up(env.redirect_delay(), EventCreatorAction::Navigate);
                    state.latest = Loadable::Failed(error);
                    smallvec![effect]
                },
            },

            EventCreatorAction::SetTitle(title) => {
                state.title = title;
                smallvec![Effect::None]
            },

            EventCreatorAction::SetStartDate(date) => {
                state.start_date = Some(date);
                smallvec![Effect::None]
            },

            EventCreatorAction::SetPoster(upload) => {
                state.poster = Some(upload);
                smallvec![Effect::None]
            },

            EventCreatorAction::Submit => {
                if state.submitting {
                    return smallvec![Effect::None];
                }
                if state.title.trim().is_empty() {
                    state.error = Some(PageError::Validation(FieldErrors::general("Title is required")));
                    return smallvec![Effect::None];
                }
                let Some(start_date) = state.start_date else {
                    state.error = Some(PageError::Validation(FieldErrors::general(
                        "Start date is required",
                    )));
                    return smallvec![Effect::None];
                };

                let latest = state.latest.value().and_then(Option::as_ref);
                let draft = new_event_draft(&state.title, start_date, env.today(), latest);
                state.submitting = true;
                state.error = None;
                let call = env.backend().create_event(draft, state.poster.clone());
                smallvec![request(call, |result| EventCreatorAction::Created { result })]
            },

            EventCreatorAction::Created { result } => {
                state.submitting = false;
                match result {
                    Ok(event) => {
                        tracing::info!(event_id = %event.id, title = %event.title, "Event created");
                        state.redirect = Some(Route::AdminEvent(event.id));
                        smallvec![Effect::None]
                    },
                    Err(error) => {
                        let error = PageError::action(&error, CREATE_FAILED);
                        let effect = error.follow_up(env.redirect_delay(), EventCreatorAction::Navigate);
                        state.error = Some(error);
                        smallvec![effect]
                    },
                }
            },

            EventCreatorAction::Navigate(route) => {
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
    use crate::features::test_support::env;
    use elephant_client::EventId;
    use elephant_runtime::Store;
    use crate::reports::MemoryReportSink;
    use elephant_testing::{assertions, fixtures, BackendCall, FixedClock, MockBackend, ReducerTest};
    use std::sync::Arc;

    #[test]
    fn test_draft_defaults_without_previous_event() {
        let draft = new_event_draft(
            " Elephant ",
            fixtures::date("2025-08-01"),
            fixtures::date("2025-06-15"),
            None,
        );

        assert_eq!(draft.title, "Elephant");
        assert_eq!(draft.ticket_deadline, "2025-07-15");
        assert_eq!(draft.bundle_size, Some(2));
        assert_eq!(draft.ticket_price_bundle, Some(80.0));
        assert!(!draft.is_active);
        assert_eq!(draft.email_template_content, DEFAULT_EMAIL_TEMPLATE);
        assert_eq!(draft.inactive_message.as_deref(), Some(DEFAULT_INACTIVE_MESSAGE));
    }

    #[test]
    fn test_latest_event_text_carries_over() {
        let mut old = fixtures::event(1, "Old", "2025-01-01");
        old.email_template_content = "old".to_string();
        let mut newest = fixtures::event(2, "New", "2025-05-01");
        newest.inactive_message = Some("Sold out, see you next time".to_string());

        let latest = most_recent(vec![old, newest]).unwrap();
        let draft = new_event_draft("Next", fixtures::date("2025-09-01"), fixtures::date("2025-06-15"), Some(&latest));

        assert_eq!(draft.email_template_content, "See you on the dance floor!");
        assert_eq!(draft.inactive_message.as_deref(), Some("Sold out, see you next time"));
    }

    #[test]
    fn test_submit_without_start_date_is_rejected() {
        ReducerTest::new(EventCreatorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(EventCreatorState::default())
            .given_actions([EventCreatorAction::SetTitle("Elephant".into())])
            .when_action(EventCreatorAction::Submit)
            .then_state(|state| {
                assert!(matches!(state.error, Some(PageError::Validation(_))));
                assert!(!state.submitting);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_created_event_opens_in_editor() {
        let backend = MockBackend::new().with_events([fixtures::event(7, "Last", "2025-05-01")]);
        let store = Store::new(EventCreatorState::default(), EventCreatorReducer::new(), env(&backend));

        store.send(EventCreatorAction::Load).await.wait().await;
        store.send(EventCreatorAction::SetTitle("Elephant: Halloween".into())).await;
        store
            .send(EventCreatorAction::SetStartDate(fixtures::date("2025-10-31")))
            .await;
        store.send(EventCreatorAction::Submit).await.wait().await;

        let created = backend
            .stored_events()
            .into_iter()
            .find(|e| e.title == "Elephant: Halloween")
            .unwrap();
        assert_ne!(created.id, EventId(7));
        assert!(!created.is_active);
        assert_eq!(store.state(|s| s.redirect).await, Some(Route::AdminEvent(created.id)));
        assert!(backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::CreateEvent { poster: None, .. })));
    }

    #[tokio::test]
    async fn test_failed_create_keeps_inputs() {
        let backend = MockBackend::new();
        backend.fail_next(
            elephant_testing::Endpoint::CreateEvent,
            ApiError::RequestFailed("reset".into()),
        );
        let store = Store::new(EventCreatorState::default(), EventCreatorReducer::new(), env(&backend));

        store.send(EventCreatorAction::SetTitle("Elephant".into())).await;
        store
            .send(EventCreatorAction::SetStartDate(fixtures::date("2025-10-31")))
            .await;
        store.send(EventCreatorAction::Submit).await.wait().await;

        let state = store.state(EventCreatorState::clone).await;
        assert_eq!(state.error, Some(PageError::Transport(CREATE_FAILED.to_string())));
        assert_eq!(state.title, "Elephant");
        assert!(state.redirect.is_none());
    }

    #[tokio::test]
    async fn test_deadline_counts_from_local_date_after_midnight() {
        let backend = MockBackend::new();
        // 02:00 on the 15th in UTC+8, still the 14th in UTC
        let clock = FixedClock::new(fixtures::timestamp("2025-06-14T18:00:00Z"));
        let env = PageEnvironment::new(
            Arc::new(backend.clone()),
            Arc::new(clock),
            Arc::new(MemoryReportSink::new()),
        );
        let store = Store::new(EventCreatorState::default(), EventCreatorReducer::new(), env);

        store.send(EventCreatorAction::SetTitle("Elephant".into())).await;
        store
            .send(EventCreatorAction::SetStartDate(fixtures::date("2025-10-31")))
            .await;
        store.send(EventCreatorAction::Submit).await.wait().await;

        let created = backend.stored_events().into_iter().next().unwrap();
        assert_eq!(created.ticket_deadline, "2025-07-15");
    }
}
