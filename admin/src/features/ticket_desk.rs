//! Ticket desk: list, search, sort, create, edit and delete the purchases of one event

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::field_errors::{Field, FieldErrors};
use crate::page::{Loadable, PageError, Route, LOAD_FAILED_MESSAGE};
use crate::ticket_form::{FormEdit, TicketForm};
use crate::tickets::{self, SortKey, TicketSort};
use elephant_client::{ApiError, Event, EventId, TicketId, TicketPurchase};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};
use futures::FutureExt;

const DELETE_FAILED: &str = "Failed to delete ticket. Please try again.";
const REFRESH_FAILED: &str = "Failed to fetch updated tickets";

/// Ticket desk state
#[derive(Clone, Debug, PartialEq)]
pub struct TicketDeskState {
    /// Event whose tickets are shown
    pub event_id: EventId,
    /// The event itself (for its title)
    pub event: Loadable<Event>,
    /// Purchases of this event
    pub tickets: Vec<TicketPurchase>,
    /// Search box
    pub search: String,
    /// Active sort
    pub sort: TicketSort,
    /// Open create/edit form
    pub form: Option<TicketForm>,
    /// Errors shown next to the form fields
    pub form_errors: FieldErrors,
    /// A save is in flight
    pub submitting: bool,
    /// Ticket waiting for delete confirmation
    pub confirm_delete: Option<TicketId>,
    /// Last failed action outside the form
    pub error: Option<PageError>,
    /// Where the page wants to go
    pub redirect: Option<Route>,
}

impl TicketDeskState {
    /// Desk for one event, nothing loaded
    #[must_use]
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            event: Loadable::Idle,
            tickets: Vec::new(),
            search: String::new(),
            sort: TicketSort::default(),
            form: None,
            form_errors: FieldErrors::new(),
            submitting: false,
            confirm_delete: None,
            error: None,
            redirect: None,
        }
    }

    /// Tickets matching the search, in the active sort
    #[must_use]
    pub fn visible(&self) -> Vec<&TicketPurchase> {
        tickets::visible_tickets(&self.tickets, &self.search, self.sort)
    }

    fn keep_own(&self, all: Vec<TicketPurchase>) -> Vec<TicketPurchase> {
        all.into_iter()
            .filter(|t| t.event_id == self.event_id)
            .collect()
    }
}

/// Ticket desk actions
#[derive(Clone, Debug)]
pub enum TicketDeskAction {
    /// Fetch the event and all tickets
    Load,
    /// Both fetches finished
    Loaded {
        /// Event and every ticket of every event
        result: Result<(Event, Vec<TicketPurchase>), ApiError>,
    },
    /// Type into the search box
    SetSearch(String),
    /// Click a column header
    SortBy(SortKey),
    /// Open an empty create form
    OpenCreateForm,
    /// Open the edit form of one ticket
    EditTicket(TicketId),
    /// Close the form without saving
    CloseForm,
    /// Change a buyer, attendee or contact field
    Edit(FormEdit),
    /// Type into the total price
    SetTotalPrice(String),
    /// Validate and save the form
    Submit,
    /// Backend answered a create or update
    Saved {
        /// Stored purchase
        result: Result<TicketPurchase, ApiError>,
    },
    /// Tickets refetched after a save
    Refreshed {
        /// Every ticket of every event
        result: Result<Vec<TicketPurchase>, ApiError>,
    },
    /// Ask to delete one ticket
    RequestDelete(TicketId),
    /// Back out of the delete
    CancelDelete,
    /// Delete the ticket waiting for confirmation
    ConfirmDelete,
    /// Backend answered a delete
    Deleted {
        /// Deleted ticket
        id: TicketId,
        /// Outcome
        result: Result<(), ApiError>,
    },
    /// Go somewhere else
    Navigate(Route),
}

/// Ticket desk reducer
#[derive(Clone, Debug, Default)]
pub struct TicketDeskReducer;

impl TicketDeskReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn auth_redirect(
    state: &mut TicketDeskState,
    env: &PageEnvironment,
) -> SmallVec<[Effect<TicketDeskAction>; 4]> {
    let error = PageError::AuthRequired;
    let effect = error.follow_up(env.redirect_delay(), TicketDeskAction::Navigate);
    state.error = Some(error);
    smallvec![effect]
}

impl Reducer for TicketDeskReducer {
    type State = TicketDeskState;
    type Action = TicketDeskAction;
    type Environment = PageEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per page action
    fn reduce(
        &self,
        state: &mut TicketDeskState,
        action: TicketDeskAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<TicketDeskAction>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Loading
            // ═══════════════════════════════════════════════════════════════
            TicketDeskAction::Load => {
                state.event = Loadable::Loading;
                state.error = None;

                let backend = env.backend();
                let call = futures::future::try_join(
                    backend.admin_event(state.event_id),
                    backend.tickets(),
                );
                smallvec![request(call.boxed(), |result| TicketDeskAction::Loaded { result })]
            },

            TicketDeskAction::Loaded { result } => match result {
                Ok((event, all)) => {
                    state.tickets = state.keep_own(all);
                    tracing::debug!(event_id = %event.id, tickets = state.tickets.len(), "Tickets loaded");
                    state.event = Loadable::Loaded(event);
                    smallvec![Effect::None]
                },
                Err(error) => {
                    let error = PageError::load(&error, LOAD_FAILED_MESSAGE);
                    let effect = error.follow_up(env.redirect_delay(), TicketDeskAction::Navigate);
                    state.event = Loadable::Failed(error);
                    smallvec![effect]
                },
            },

            // ═══════════════════════════════════════════════════════════════
            // List
            // ═══════════════════════════════════════════════════════════════
            TicketDeskAction::SetSearch(search) => {
                state.search = search;
                smallvec![Effect::None]
            },

            TicketDeskAction::SortBy(key) => {
                state.sort = state.sort.toggled(key);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Form
            // ═══════════════════════════════════════════════════════════════
            TicketDeskAction::OpenCreateForm => {
                state.form = Some(TicketForm::new());
                state.form_errors = FieldErrors::new();
                smallvec![Effect::None]
            },

            TicketDeskAction::EditTicket(id) => {
                if let Some(ticket) = state.tickets.iter().find(|t| t.id == id) {
                    state.form = Some(TicketForm::edit(ticket));
                    state.form_errors = FieldErrors::new();
                }
                smallvec![Effect::None]
            },

            TicketDeskAction::CloseForm => {
                state.form = None;
                state.form_errors = FieldErrors::new();
                smallvec![Effect::None]
            },

            TicketDeskAction::Edit(edit) => {
                if let Some(form) = state.form.as_mut() {
                    match form.apply(edit) {
                        Ok(()) => state.form_errors.clear(Field::Attendees),
                        Err(e) => state.form_errors.set(Field::Attendees, e.to_string()),
                    }
                }
                smallvec![Effect::None]
            },

            TicketDeskAction::SetTotalPrice(price) => {
                if let Some(form) = state.form.as_mut() {
                    form.total_price = price;
                }
                smallvec![Effect::None]
            },

            TicketDeskAction::Submit => {
                let Some(form) = state.form.as_ref() else {
                    return smallvec![Effect::None];
                };
                if state.submitting {
                    return smallvec![Effect::None];
                }

                let editing = form.editing;
                let submission = match form.validate(state.event_id) {
                    Ok(submission) => submission,
                    Err(errors) => {
                        state.form_errors = errors;
                        return smallvec![Effect::None];
                    },
                };

                state.submitting = true;
                state.error = None;
                state.form_errors = FieldErrors::new();

                let backend = env.backend();
                let call = match editing {
                    Some(id) => backend.update_ticket(id, submission),
                    None => backend.create_ticket(submission),
                };
                smallvec![request(call, |result| TicketDeskAction::Saved { result })]
            },

            TicketDeskAction::Saved { result } => match result {
                Ok(ticket) => {
                    tracing::info!(ticket_id = %ticket.id, event_id = %ticket.event_id, "Ticket saved");
                    smallvec![request(env.backend().tickets(), |result| {
                        TicketDeskAction::Refreshed { result }
                    })]
                },
                Err(error) => {
                    state.submitting = false;
                    if error.is_unauthorized() {
                        return auth_redirect(state, env);
                    }
                    tracing::warn!(%error, "Ticket save rejected");
                    state.form_errors = FieldErrors::from_api_error(&error);
                    smallvec![Effect::None]
                },
            },

            TicketDeskAction::Refreshed { result } => {
                state.submitting = false;
                match result {
                    Ok(all) => {
                        state.tickets = state.keep_own(all);
                        state.form = None;
                        state.form_errors = FieldErrors::new();
                        smallvec![Effect::None]
                    },
                    Err(error) if error.is_unauthorized() => auth_redirect(state, env),
                    Err(error) => {
                        tracing::warn!(%error, "Ticket refresh failed");
                        state.form_errors = FieldErrors::general(REFRESH_FAILED);
                        smallvec![Effect::None]
                    },
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // Delete
            // ═══════════════════════════════════════════════════════════════
            TicketDeskAction::RequestDelete(id) => {
                state.confirm_delete = Some(id);
                smallvec![Effect::None]
            },

            TicketDeskAction::CancelDelete => {
                state.confirm_delete = None;
                smallvec![Effect::None]
            },

            TicketDeskAction::ConfirmDelete => {
                let Some(id) = state.confirm_delete.take() else {
                    return smallvec![Effect::None];
                };
                state.error = None;
                smallvec![request(env.backend().delete_ticket(id), move |result| {
                    TicketDeskAction::Deleted { id, result }
                })]
            },

            TicketDeskAction::Deleted { id, result } => match result {
                Ok(()) => {
                    tracing::info!(ticket_id = %id, "Ticket deleted");
                    state.tickets.retain(|t| t.id != id);
                    smallvec![Effect::None]
                },
                Err(error) => {
                    let error = PageError::action(&error, DELETE_FAILED);
                    let effect = error.follow_up(env.redirect_delay(), TicketDeskAction::Navigate);
                    state.error = Some(error);
                    smallvec![effect]
                },
            },

            TicketDeskAction::Navigate(route) => {
                state.redirect = Some(route);
                smallvec![Effect::None]
            },
        }
    }
}
