//! Public event page with the ticket purchase form

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::field_errors::{Field, FieldErrors};
use crate::page::{Loadable, PageError};
use crate::ticket_form::{FormEdit, PurchaseForm};
use elephant_client::{ApiError, Event, EventId, TicketPurchase};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};

/// Purchase page state
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseState {
    /// Event on sale
    pub event_id: EventId,
    /// The event
    pub event: Loadable<Event>,
    /// Buyer form
    pub form: PurchaseForm,
    /// Errors shown next to the form fields
    pub form_errors: FieldErrors,
    /// Purchase in flight
    pub submitting: bool,
    /// Confirmed purchase
    pub purchase: Option<TicketPurchase>,
}

impl PurchaseState {
    /// Purchase page for one event, nothing loaded
    #[must_use]
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            event: Loadable::Idle,
            form: PurchaseForm::default(),
            form_errors: FieldErrors::new(),
            submitting: false,
            purchase: None,
        }
    }

    /// Whether the form can be sent at all
    #[must_use]
    pub fn on_sale(&self) -> bool {
        self.event
            .value()
            .is_some_and(|e| e.is_active && e.tickets_left() > 0)
    }
}

/// Purchase page actions
#[derive(Clone, Debug)]
pub enum PurchaseAction {
    /// Fetch the event
    Load,
    /// Event fetched
    Loaded {
        /// The event
        result: Result<Event, ApiError>,
    },
    /// Change the form
    Edit(FormEdit),
    /// Buy the tickets
    Submit,
    /// Backend answered the purchase
    Purchased {
        /// The recorded purchase
        result: Result<TicketPurchase, ApiError>,
    },
}

/// Purchase page reducer
#[derive(Clone, Debug, Default)]
pub struct PurchaseReducer;

impl PurchaseReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for PurchaseReducer {
    type State = PurchaseState;
    type Action = PurchaseAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut PurchaseState,
        action: PurchaseAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<PurchaseAction>; 4]> {
        match action {
            PurchaseAction::Load => {
                state.event = Loadable::Loading;
                smallvec![request(env.backend().public_event(state.event_id), |result| {
                    PurchaseAction::Loaded { result }
                })]
            },

            PurchaseAction::Loaded { result } => {
                state.event = match result {
                    Ok(event) => Loadable::Loaded(event),
                    Err(error) => Loadable::Failed(PageError::load_event(&error)),
                };
                smallvec![Effect::None]
            },

            PurchaseAction::Edit(edit) => {
                match state.form.apply(edit) {
                    Ok(()) => state.form_errors.clear(Field::Attendees),
                    Err(e) => state.form_errors.set(Field::Attendees, e.to_string()),
                }
                smallvec![Effect::None]
            },

            PurchaseAction::Submit => {
                if state.submitting || !state.event.is_loaded() {
                    return smallvec![Effect::None];
                }
                let purchase = match state.form.validate() {
                    Ok(purchase) => purchase,
                    Err(errors) => {
                        state.form_errors = errors;
                        return smallvec![Effect::None];
                    },
                };
                state.form_errors = FieldErrors::new();
                state.submitting = true;
                let call = env.backend().purchase_tickets(state.event_id, purchase);
                smallvec![request(call, |result| PurchaseAction::Purchased { result })]
            },

            PurchaseAction::Purchased { result } => {
                state.submitting = false;
                match result {
                    Ok(purchase) => {
                        let quantity = u32::try_from(purchase.attendees.len()).unwrap_or(u32::MAX);
                        tracing::info!(
                            ticket_id = %purchase.id,
                            event_id = %state.event_id,
                            quantity,
                            "Tickets purchased"
                        );
                        if let Some(event) = state.event.value_mut() {
                            event.sold_tickets = event.sold_tickets.saturating_add(quantity);
                        }
                        state.purchase = Some(purchase);
                        state.form = PurchaseForm::default();
                    },
                    Err(error) => {
                        tracing::warn!(%error, event_id = %state.event_id, "Purchase rejected");
                        state.form_errors = FieldErrors::from_api_error(&error);
                    },
                }
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
    use elephant_client::Upload;
    use elephant_runtime::Store;
    use elephant_testing::{assertions, fixtures, BackendCall, MockBackend, ReducerTest};

    fn fill_form() -> Vec<PurchaseAction> {
        vec![
            PurchaseAction::Edit(FormEdit::BuyerName("Andi".into())),
            PurchaseAction::Edit(FormEdit::AddAttendee),
            PurchaseAction::Edit(FormEdit::AddAttendee),
            PurchaseAction::Edit(FormEdit::Attendee {
                index: 1,
                name: "Jo".into(),
            }),
            PurchaseAction::Edit(FormEdit::Phone("09171234567".into())),
            PurchaseAction::Edit(FormEdit::Email("andi@example.com".into())),
            PurchaseAction::Edit(FormEdit::ReferenceNumber("GC-1".into())),
            PurchaseAction::Edit(FormEdit::Payslip(Upload::new(
                "slip.png",
                "image/png",
                vec![0x89, 0x50],
            ))),
        ]
    }

    #[test]
    fn test_missing_payslip_is_caught_locally() {
        ReducerTest::new(PurchaseReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(PurchaseState::new(EventId(3)))
            .given_actions([
                PurchaseAction::Loaded {
                    result: Ok(fixtures::event(3, "Elephant", "2025-06-28")),
                },
                PurchaseAction::Edit(FormEdit::BuyerName("Andi".into())),
            ])
            .when_action(PurchaseAction::Submit)
            .then_state(|state| {
                assert!(state.form_errors.get(Field::Payslip).is_some());
                assert!(!state.submitting);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_buyer_cannot_be_removed() {
        ReducerTest::new(PurchaseReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(PurchaseState::new(EventId(3)))
            .when_action(PurchaseAction::Edit(FormEdit::RemoveAttendee(0)))
            .then_state(|state| assert!(state.form_errors.get(Field::Attendees).is_some()))
            .run();
    }

    #[test]
    fn test_attendee_error_clears_after_next_edit() {
        ReducerTest::new(PurchaseReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(PurchaseState::new(EventId(3)))
            .given_actions([PurchaseAction::Edit(FormEdit::RemoveAttendee(0))])
            .when_action(PurchaseAction::Edit(FormEdit::BuyerName("Andi".to_string())))
            .then_state(|state| {
                assert!(state.form_errors.get(Field::Attendees).is_none());
                assert_eq!(state.form.names.buyer_name(), "Andi");
            })
            .run();
    }

    #[tokio::test]
    async fn test_quantity_counts_named_attendees() {
        let backend = MockBackend::new().with_events([fixtures::event(3, "Elephant", "2025-06-28")]);
        let store = Store::new(PurchaseState::new(EventId(3)), PurchaseReducer::new(), env(&backend));

        store.send(PurchaseAction::Load).await.wait().await;
        for action in fill_form() {
            store.send(action).await;
        }
        store.send(PurchaseAction::Submit).await.wait().await;

        let request = backend
            .calls()
            .into_iter()
            .find_map(|call| match call {
                BackendCall::PurchaseTickets { request, .. } => Some(request),
                _ => None,
            })
            .unwrap();
        assert_eq!(request.quantity, 2);
        assert_eq!(request.attendee_names, ["Andi", "Jo"]);

        let state = store.state(PurchaseState::clone).await;
        assert!(state.purchase.is_some());
        assert_eq!(state.event.value().unwrap().sold_tickets, 2);
        assert_eq!(state.form, PurchaseForm::default());
    }

    #[tokio::test]
    async fn test_inactive_event_error_stays_on_form() {
        let mut event = fixtures::event(3, "Elephant", "2025-06-28");
        event.is_active = false;
        let backend = MockBackend::new().with_events([event]);
        let store = Store::new(PurchaseState::new(EventId(3)), PurchaseReducer::new(), env(&backend));

        store.send(PurchaseAction::Load).await.wait().await;
        assert!(!store.state(PurchaseState::on_sale).await);
        for action in fill_form() {
            store.send(action).await;
        }
        store.send(PurchaseAction::Submit).await.wait().await;

        let state = store.state(PurchaseState::clone).await;
        assert!(state.purchase.is_none());
        assert_eq!(state.form_errors.get(Field::General), Some("This event is no longer active"));
        assert_eq!(state.form.names.buyer_name(), "Andi");
    }
}
