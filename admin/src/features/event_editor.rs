//! Event editor: edit fields, replace the poster, toggle sales, delete

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::page::{Loadable, PageError, Route};
use chrono::NaiveDate;
use elephant_client::{ApiError, Event, EventDraft, EventId, Upload};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};

const UPDATE_FAILED: &str = "Failed to update event. Please try again.";
const STATUS_FAILED: &str = "Failed to update event status. Please try again.";
const DELETE_FAILED: &str = "Failed to delete event. Please try again.";

/// One edit to an editable event field
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)] // Variants are named after the fields they set
pub enum DraftEdit {
    Title(String),
    DisplayDate(String),
    VenueName(String),
    VenueAddress(String),
    EventTime(String),
    Description(String),
    EmailTemplate(String),
    RegularPrice(f64),
    /// `None` clears the bundle price
    BundlePrice(Option<f64>),
    /// `None` clears the bundle size
    BundleSize(Option<u32>),
    MaxTickets(u32),
    TicketDeadline(String),
    /// `None` or empty clears the message
    InactiveMessage(Option<String>),
    StartDate(NaiveDate),
    WalkInPrice(f64),
}

impl DraftEdit {
    /// Write the edit into `draft`
    pub fn apply(self, draft: &mut EventDraft) {
        match self {
            Self::Title(v) => draft.title = v,
            Self::DisplayDate(v) => draft.display_date = v,
            Self::VenueName(v) => draft.venue_name = v,
            Self::VenueAddress(v) => draft.venue_address = v,
            Self::EventTime(v) => draft.event_time = v,
            Self::Description(v) => draft.description = v,
            Self::EmailTemplate(v) => draft.email_template_content = v,
            Self::RegularPrice(v) => draft.ticket_price_regular = v,
            Self::BundlePrice(v) => draft.ticket_price_bundle = v,
            Self::BundleSize(v) => draft.bundle_size = v,
            Self::MaxTickets(v) => draft.max_tickets = v,
            Self::TicketDeadline(v) => draft.ticket_deadline = v,
            Self::InactiveMessage(v) => draft.inactive_message = v.filter(|m| !m.is_empty()),
            Self::StartDate(v) => draft.start_date = v,
            Self::WalkInPrice(v) => draft.walk_in_price = v,
        }
    }
}

/// Editor state
#[derive(Clone, Debug, PartialEq)]
pub struct EventEditorState {
    /// Event being edited
    pub event_id: EventId,
    /// Event as the backend last returned it
    pub event: Loadable<Event>,
    /// Editable copy of the event's fields
    pub draft: Option<EventDraft>,
    /// New poster to upload with the next save
    pub poster: Option<Upload>,
    /// A save or status change is in flight
    pub submitting: bool,
    /// Delete confirmation is showing
    pub confirm_delete: bool,
    /// Success banner
    pub notice: Option<String>,
    /// Last failed action
    pub error: Option<PageError>,
    /// Where the page wants to go
    pub redirect: Option<Route>,
}

impl EventEditorState {
    /// Editor for one event, nothing loaded
    #[must_use]
    pub const fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            event: Loadable::Idle,
            draft: None,
            poster: None,
            submitting: false,
            confirm_delete: false,
            notice: None,
            error: None,
            redirect: None,
        }
    }

    fn refresh(&mut self, event: Event) {
        self.draft = Some(EventDraft::from(&event));
        self.event = Loadable::Loaded(event);
    }
}

/// Editor actions
#[derive(Clone, Debug)]
pub enum EventEditorAction {
    /// Fetch the event
    Load,
    /// Event fetched
    Loaded {
        /// The event
        result: Result<Event, ApiError>,
    },
    /// Change one field
    Edit(DraftEdit),
    /// Choose a new poster
    SetPoster(Upload),
    /// Send the draft (and poster)
    Save,
    /// Backend answered a save
    Saved {
        /// Updated event
        result: Result<Event, ApiError>,
    },
    /// Flip `is_active`
    ToggleActive,
    /// Backend answered a status change
    StatusChanged {
        /// Updated event
        result: Result<Event, ApiError>,
    },
    /// Ask for delete confirmation
    RequestDelete,
    /// Back out of the delete
    CancelDelete,
    /// Delete the event
    ConfirmDelete,
    /// Backend answered the delete
    Deleted {
        /// Outcome
        result: Result<(), ApiError>,
    },
    /// Go somewhere else
    Navigate(Route),
}

/// Editor reducer
#[derive(Clone, Debug, Default)]
pub struct EventEditorReducer;

impl EventEditorReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn failed(
        state: &mut EventEditorState,
        env: &PageEnvironment,
        error: &ApiError,
        fallback: &str,
    ) -> Effect<EventEditorAction> {
        let error = PageError::action(error, fallback);
        let effect = error.follow_up(env.redirect_delay(), EventEditorAction::Navigate);
        state.error = Some(error);
        effect
    }
}

impl Reducer for EventEditorReducer {
    type State = EventEditorState;
    type Action = EventEditorAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut EventEditorState,
        action: EventEditorAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<EventEditorAction>; 4]> {
        match action {
            EventEditorAction::Load => {
                state.event = Loadable::Loading;
                smallvec![request(env.backend().admin_event(state.event_id), |result| {
                    EventEditorAction::Loaded { result }
                })]
            },

            EventEditorAction::Loaded { result } => match result {
                Ok(event) => {
                    state.refresh(event);
                    smallvec![Effect::None]
                },
                Err(error) => {
                    let error = PageError::load_event(&error);
                    let effect = error.follow_up(env.redirect_delay(), EventEditorAction::Navigate);
                    state.event = Loadable::Failed(error);
                    smallvec![effect]
                },
            },

            // ═══════════════════════════════════════════════════════════════
            // Field edits
            // ═══════════════════════════════════════════════════════════════
            EventEditorAction::Edit(edit) => {
                if let Some(draft) = state.draft.as_mut() {
                    edit.apply(draft);
                }
                smallvec![Effect::None]
            },

            EventEditorAction::SetPoster(upload) => {
                state.poster = Some(upload);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Save
            // ═══════════════════════════════════════════════════════════════
            EventEditorAction::Save => {
                let Some(draft) = state.draft.clone() else {
                    return smallvec![Effect::None];
                };
                if state.submitting {
                    return smallvec![Effect::None];
                }
                state.submitting = true;
                state.notice = None;
                state.error = None;
                let call = env.backend().update_event(state.event_id, draft, state.poster.clone());
                smallvec![request(call, |result| EventEditorAction::Saved { result })]
            },

            EventEditorAction::Saved { result } => {
                state.submitting = false;
                match result {
                    Ok(event) => {
                        tracing::info!(event_id = %event.id, "Event updated");
                        state.refresh(event);
                        state.poster = None;
                        state.notice = Some("Event updated successfully!".to_string());
                        smallvec![Effect::None]
                    },
                    Err(error) => smallvec![Self::failed(state, env, &error, UPDATE_FAILED)],
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // Active status
            // ═══════════════════════════════════════════════════════════════
            EventEditorAction::ToggleActive => {
                let Some(event) = state.event.value() else {
                    return smallvec![Effect::None];
                };
                if state.submitting {
                    return smallvec![Effect::None];
                }
                let call = env.backend().set_event_active(state.event_id, !event.is_active);
                state.submitting = true;
                state.notice = None;
                state.error = None;
                smallvec![request(call, |result| EventEditorAction::StatusChanged { result })]
            },

            EventEditorAction::StatusChanged { result } => {
                state.submitting = false;
                match result {
                    Ok(event) => {
                        let status = if event.is_active { "activated" } else { "deactivated" };
                        tracing::info!(event_id = %event.id, is_active = event.is_active, "Event status changed");
                        state.notice = Some(format!("Event {status} successfully!"));
                        state.refresh(event);
                        smallvec![Effect::None]
                    },
                    Err(error) => smallvec![Self::failed(state, env, &error, STATUS_FAILED)],
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // Delete
            // ═══════════════════════════════════════════════════════════════
            EventEditorAction::RequestDelete => {
                state.confirm_delete = true;
                smallvec![Effect::None]
            },

            EventEditorAction::CancelDelete => {
                state.confirm_delete = false;
                smallvec![Effect::None]
            },

            EventEditorAction::ConfirmDelete => {
                if !state.confirm_delete {
                    return smallvec![Effect::None];
                }
                state.error = None;
                smallvec![request(env.backend().delete_event(state.event_id), |result| {
                    EventEditorAction::Deleted { result }
                })]
            },

            EventEditorAction::Deleted { result } => {
                state.confirm_delete = false;
                match result {
                    Ok(()) => {
                        tracing::info!(event_id = %state.event_id, "Event deleted");
                        state.redirect = Some(Route::AdminDashboard);
                        smallvec![Effect::None]
                    },
                    Err(error) => smallvec![Self::failed(state, env, &error, DELETE_FAILED)],
                }
            },

            EventEditorAction::Navigate(route) => {
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
    use elephant_testing::{assertions, fixtures, BackendCall, Endpoint, MockBackend, ReducerTest};

    fn loaded() -> EventEditorAction {
        EventEditorAction::Loaded {
            result: Ok(fixtures::event(4, "Elephant", "2025-06-28")),
        }
    }

    #[test]
    fn test_edits_change_draft_only() {
        ReducerTest::new(EventEditorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(EventEditorState::new(EventId(4)))
            .given_actions([loaded(), EventEditorAction::Edit(DraftEdit::Title("Elephant XL".into()))])
            .when_action(EventEditorAction::Edit(DraftEdit::BundleSize(None)))
            .then_state(|state| {
                let draft = state.draft.as_ref().unwrap();
                assert_eq!(draft.title, "Elephant XL");
                assert_eq!(draft.bundle_size, None);
                assert_eq!(state.event.value().unwrap().title, "Elephant");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_confirm_without_request_does_nothing() {
        ReducerTest::new(EventEditorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(EventEditorState::new(EventId(4)))
            .given_actions([loaded()])
            .when_action(EventEditorAction::ConfirmDelete)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_unauthorized_save_redirects() {
        ReducerTest::new(EventEditorReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(EventEditorState::new(EventId(4)))
            .given_actions([loaded()])
            .when_action(EventEditorAction::Saved {
                result: Err(ApiError::Unauthorized),
            })
            .then_state(|state| assert_eq!(state.error, Some(PageError::AuthRequired)))
            .then_effects(|effects| {
                let action = assertions::assert_has_delay_effect(effects, REDIRECT);
                assert!(matches!(action, EventEditorAction::Navigate(Route::AdminLogin)));
            })
            .run();
    }

    #[tokio::test]
    async fn test_save_sends_draft_and_poster() {
        let backend = MockBackend::new().with_events([fixtures::event(4, "Elephant", "2025-06-28")]);
        let store = Store::new(
            EventEditorState::new(EventId(4)),
            EventEditorReducer::new(),
            env(&backend),
        );
        let poster = Upload::new("poster.jpg", "image/jpeg", vec![1, 2, 3]);

        store.send(EventEditorAction::Load).await.wait().await;
        store
            .send(EventEditorAction::Edit(DraftEdit::VenueName("Warehouse".into())))
            .await;
        store.send(EventEditorAction::SetPoster(poster.clone())).await;
        store.send(EventEditorAction::Save).await.wait().await;

        let state = store.state(EventEditorState::clone).await;
        assert_eq!(state.notice.as_deref(), Some("Event updated successfully!"));
        assert_eq!(state.event.value().unwrap().venue_name, "Warehouse");
        assert!(state.poster.is_none());
        assert!(backend.calls().iter().any(|call| matches!(
            call,
            BackendCall::UpdateEvent { id: EventId(4), poster: Some(p), .. } if *p == poster
        )));
    }

    #[tokio::test]
    async fn test_toggle_active_reports_new_status() {
        let backend = MockBackend::new().with_events([fixtures::event(4, "Elephant", "2025-06-28")]);
        let store = Store::new(
            EventEditorState::new(EventId(4)),
            EventEditorReducer::new(),
            env(&backend),
        );

        store.send(EventEditorAction::Load).await.wait().await;
        store.send(EventEditorAction::ToggleActive).await.wait().await;

        let state = store.state(EventEditorState::clone).await;
        assert_eq!(state.notice.as_deref(), Some("Event deactivated successfully!"));
        assert!(!state.draft.unwrap().is_active);
        assert!(!backend.stored_events()[0].is_active);
    }

    #[tokio::test]
    async fn test_failed_status_change_shows_fallback() {
        let backend = MockBackend::new().with_events([fixtures::event(4, "Elephant", "2025-06-28")]);
        backend.fail_next(Endpoint::SetEventActive, ApiError::RequestFailed("reset".into()));
        let store = Store::new(
            EventEditorState::new(EventId(4)),
            EventEditorReducer::new(),
            env(&backend),
        );

        store.send(EventEditorAction::Load).await.wait().await;
        store.send(EventEditorAction::ToggleActive).await.wait().await;

        let error = store.state(|s| s.error.clone()).await;
        assert_eq!(error, Some(PageError::Transport(STATUS_FAILED.to_string())));
    }

    #[tokio::test]
    async fn test_confirmed_delete_returns_to_dashboard() {
        let backend = MockBackend::new().with_events([fixtures::event(4, "Elephant", "2025-06-28")]);
        let store = Store::new(
            EventEditorState::new(EventId(4)),
            EventEditorReducer::new(),
            env(&backend),
        );

        store.send(EventEditorAction::Load).await.wait().await;
        store.send(EventEditorAction::RequestDelete).await;
        store.send(EventEditorAction::ConfirmDelete).await.wait().await;

        assert_eq!(store.state(|s| s.redirect).await, Some(Route::AdminDashboard));
        assert!(backend.stored_events().is_empty());
    }
}
