//! In-memory backend double
//!
//! `MockBackend` keeps events, tickets and door lists in memory and answers
//! every [`Backend`] call the way the real service would for the happy path.
//! Failures are injected per endpoint with [`MockBackend::fail_next`], and
//! every call is recorded so tests can assert on what was (or was not) sent.

use chrono::{DateTime, Utc};
use elephant_client::{
    ApiError, Attendee, AttendeeId, Backend, BackendFuture, Credentials, Event, EventDraft,
    EventId, PageContent, PaymentType, PurchaseRequest, ReportKind, TicketId, TicketPurchase,
    TicketSubmission, Upload, WalkInAdjustment, WalkInCount,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Backend endpoints, used to target injected failures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /auth/login`
    Login,
    /// `POST /auth/logout`
    Logout,
    /// `GET /public/events`
    PublicEvents,
    /// `GET /public/events/:id`
    PublicEvent,
    /// `GET /public/pages/:name`
    PublicPage,
    /// `POST /public/events/:id/purchase`
    PurchaseTickets,
    /// `GET /admin/events`
    AdminEvents,
    /// `GET /admin/events/:id`
    AdminEvent,
    /// `POST /admin/events`
    CreateEvent,
    /// `PATCH /admin/events/:id`
    UpdateEvent,
    /// `PATCH /admin/events/:id` with `{is_active}`
    SetEventActive,
    /// `DELETE /admin/events/:id`
    DeleteEvent,
    /// `GET /admin/events/:id/attendees`
    EventAttendees,
    /// `PATCH /admin/attendees/:id/check-in`
    ToggleCheckIn,
    /// `GET /admin/events/:id/walk-ins`
    WalkInCounts,
    /// `POST /admin/events/:id/walk-ins/...`
    AdjustWalkIn,
    /// `GET /admin/events/:id/<report>`
    Report,
    /// `GET /admin/tickets`
    Tickets,
    /// `POST /admin/tickets`
    CreateTicket,
    /// `PATCH /admin/tickets/:id`
    UpdateTicket,
    /// `DELETE /admin/tickets/:id`
    DeleteTicket,
}

/// One recorded backend call with its arguments
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum BackendCall {
    Login { username: String },
    Logout,
    PublicEvents,
    PublicEvent(EventId),
    PublicPage(String),
    PurchaseTickets { event_id: EventId, request: PurchaseRequest },
    AdminEvents,
    AdminEvent(EventId),
    CreateEvent { draft: EventDraft, poster: Option<Upload> },
    UpdateEvent { id: EventId, draft: EventDraft, poster: Option<Upload> },
    SetEventActive { id: EventId, is_active: bool },
    DeleteEvent(EventId),
    EventAttendees(EventId),
    ToggleCheckIn(AttendeeId),
    WalkInCounts(EventId),
    AdjustWalkIn { id: EventId, payment_type: PaymentType, adjustment: WalkInAdjustment },
    Report { id: EventId, kind: ReportKind },
    Tickets,
    CreateTicket(TicketSubmission),
    UpdateTicket { id: TicketId, submission: TicketSubmission },
    DeleteTicket(TicketId),
}

impl BackendCall {
    /// The endpoint this call went to
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::Login { .. } => Endpoint::Login,
            Self::Logout => Endpoint::Logout,
            Self::PublicEvents => Endpoint::PublicEvents,
            Self::PublicEvent(_) => Endpoint::PublicEvent,
            Self::PublicPage(_) => Endpoint::PublicPage,
            Self::PurchaseTickets { .. } => Endpoint::PurchaseTickets,
            Self::AdminEvents => Endpoint::AdminEvents,
            Self::AdminEvent(_) => Endpoint::AdminEvent,
            Self::CreateEvent { .. } => Endpoint::CreateEvent,
            Self::UpdateEvent { .. } => Endpoint::UpdateEvent,
            Self::SetEventActive { .. } => Endpoint::SetEventActive,
            Self::DeleteEvent(_) => Endpoint::DeleteEvent,
            Self::EventAttendees(_) => Endpoint::EventAttendees,
            Self::ToggleCheckIn(_) => Endpoint::ToggleCheckIn,
            Self::WalkInCounts(_) => Endpoint::WalkInCounts,
            Self::AdjustWalkIn { .. } => Endpoint::AdjustWalkIn,
            Self::Report { .. } => Endpoint::Report,
            Self::Tickets => Endpoint::Tickets,
            Self::CreateTicket(_) => Endpoint::CreateTicket,
            Self::UpdateTicket { .. } => Endpoint::UpdateTicket,
            Self::DeleteTicket(_) => Endpoint::DeleteTicket,
        }
    }
}

#[derive(Default)]
struct Inner {
    now: Option<DateTime<Utc>>,
    credentials: Option<Credentials>,
    events: Vec<Event>,
    tickets: Vec<TicketPurchase>,
    attendees: HashMap<EventId, Vec<Attendee>>,
    pages: HashMap<String, PageContent>,
    reports: HashMap<ReportKind, Vec<u8>>,
    failures: HashMap<Endpoint, VecDeque<ApiError>>,
    calls: Vec<BackendCall>,
    next_id: u64,
}

impl Inner {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn event(&self, id: EventId) -> Result<&Event, ApiError> {
        self.events
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Event not found"))
    }

    fn event_mut(&mut self, id: EventId) -> Result<&mut Event, ApiError> {
        self.events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Event not found"))
    }

    fn attendees_from_names(&mut self, names: &[String], ticket: TicketId) -> Vec<Attendee> {
        let group = names.first().cloned().unwrap_or_default();
        names
            .iter()
            .enumerate()
            .map(|(index, name)| Attendee {
                id: AttendeeId(self.allocate_id()),
                name: name.clone(),
                checked_in: false,
                group_identifier: group.clone(),
                is_primary: index == 0,
                ticket_purchase_id: Some(ticket),
            })
            .collect()
    }
}

fn not_found(message: &str) -> ApiError {
    ApiError::NotFound {
        message: message.to_string(),
    }
}

/// In-memory [`Backend`] for reducer and store tests
///
/// Clones share the same data, so a test can keep one handle for assertions
/// while the environment owns another.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed events
    #[must_use]
    pub fn with_events(self, events: impl IntoIterator<Item = Event>) -> Self {
        {
            let mut inner = self.lock();
            for event in events {
                inner.next_id = inner.next_id.max(event.id.get());
                inner.events.push(event);
            }
        }
        self
    }

    /// Seed ticket purchases
    #[must_use]
    pub fn with_tickets(self, tickets: impl IntoIterator<Item = TicketPurchase>) -> Self {
        {
            let mut inner = self.lock();
            for ticket in tickets {
                inner.next_id = inner.next_id.max(ticket.id.get());
                inner.tickets.push(ticket);
            }
        }
        self
    }

    /// Seed the door list of an event
    #[must_use]
    pub fn with_attendees(self, event: EventId, attendees: Vec<Attendee>) -> Self {
        {
            let mut inner = self.lock();
            let highest = attendees.iter().map(|a| a.id.get()).max().unwrap_or(0);
            inner.next_id = inner.next_id.max(highest);
            inner.attendees.insert(event, attendees);
        }
        self
    }

    /// Seed a CMS page
    #[must_use]
    pub fn with_page(self, name: &str, page: PageContent) -> Self {
        self.lock().pages.insert(name.to_string(), page);
        self
    }

    /// Seed the bytes returned for a report
    #[must_use]
    pub fn with_report(self, kind: ReportKind, bytes: Vec<u8>) -> Self {
        self.lock().reports.insert(kind, bytes);
        self
    }

    /// Only accept these credentials on login (any are accepted otherwise)
    #[must_use]
    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        self.lock().credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Timestamp given to tickets created through the backend
    #[must_use]
    pub fn with_now(self, now: DateTime<Utc>) -> Self {
        self.lock().now = Some(now);
        self
    }

    /// Make the next call to `endpoint` fail with `error`
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.lock()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(error);
    }

    /// Every call received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made to one endpoint
    #[must_use]
    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .count()
    }

    /// Events as currently stored
    #[must_use]
    pub fn stored_events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Ticket purchases as currently stored
    #[must_use]
    pub fn stored_tickets(&self) -> Vec<TicketPurchase> {
        self.lock().tickets.clone()
    }

    /// Record the call, then either pop an injected failure or run `handler`
    fn respond<T, F>(&self, call: BackendCall, handler: F) -> BackendFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Inner) -> Result<T, ApiError>,
    {
        let result = {
            let mut inner = self.lock();
            let endpoint = call.endpoint();
            inner.calls.push(call);

            let injected = inner
                .failures
                .get_mut(&endpoint)
                .and_then(VecDeque::pop_front);
            match injected {
                Some(error) => Err(error),
                None => handler(&mut *inner),
            }
        };

        Box::pin(futures::future::ready(result))
    }
}

fn ticket_from_submission(
    inner: &mut Inner,
    id: TicketId,
    event_id: EventId,
    created_at: DateTime<Utc>,
    submission: &TicketSubmission,
) -> TicketPurchase {
    let attendees = inner.attendees_from_names(&submission.attendee_names, id);
    TicketPurchase {
        id,
        event_id,
        buyer_name: submission.buyer_name.clone(),
        phone: submission.phone.clone(),
        email: submission.email.clone(),
        payslip_url: submission
            .payslip
            .as_ref()
            .map(|p| format!("/uploads/{}", p.file_name))
            .unwrap_or_default(),
        reference_number: submission.reference_number.clone(),
        total_price: submission.total_price,
        created_at,
        attendees,
    }
}

fn event_from_draft(id: EventId, draft: &EventDraft, poster: Option<&Upload>) -> Event {
    Event {
        id,
        title: draft.title.clone(),
        display_date: draft.display_date.clone(),
        venue_name: draft.venue_name.clone(),
        venue_address: draft.venue_address.clone(),
        event_time: draft.event_time.clone(),
        description: draft.description.clone(),
        email_template_content: draft.email_template_content.clone(),
        ticket_price_regular: draft.ticket_price_regular,
        ticket_price_bundle: draft.ticket_price_bundle,
        bundle_size: draft.bundle_size,
        max_tickets: draft.max_tickets,
        sold_tickets: 0,
        ticket_deadline: draft.ticket_deadline.clone(),
        is_active: draft.is_active,
        inactive_message: draft.inactive_message.clone(),
        start_date: draft.start_date,
        walk_in_price: draft.walk_in_price,
        walk_in_cash_count: 0,
        walk_in_gcash_count: 0,
        poster_image_url: poster.map(|p| format!("/posters/{}", p.file_name)),
    }
}

impl Backend for MockBackend {
    fn login(&self, credentials: Credentials) -> BackendFuture<()> {
        let call = BackendCall::Login {
            username: credentials.username.clone(),
        };
        self.respond(call, move |inner| match &inner.credentials {
            Some(expected) if *expected != credentials => Err(ApiError::Unauthorized),
            _ => Ok(()),
        })
    }

    fn logout(&self) -> BackendFuture<()> {
        self.respond(BackendCall::Logout, |_| Ok(()))
    }

    fn public_events(&self) -> BackendFuture<Vec<Event>> {
        self.respond(BackendCall::PublicEvents, |inner| Ok(inner.events.clone()))
    }

    fn public_event(&self, id: EventId) -> BackendFuture<Event> {
        self.respond(BackendCall::PublicEvent(id), move |inner| {
            inner.event(id).cloned()
        })
    }

    fn public_page(&self, name: String) -> BackendFuture<PageContent> {
        let call = BackendCall::PublicPage(name.clone());
        self.respond(call, move |inner| {
            inner
                .pages
                .get(&name)
                .cloned()
                .ok_or_else(|| not_found("Page not found"))
        })
    }

    fn purchase_tickets(
        &self,
        event_id: EventId,
        request: PurchaseRequest,
    ) -> BackendFuture<TicketPurchase> {
        let call = BackendCall::PurchaseTickets {
            event_id,
            request: request.clone(),
        };
        self.respond(call, move |inner| {
            let event = inner.event(event_id)?;
            if !event.is_active {
                return Err(ApiError::Api {
                    status: 400,
                    message: "Event is not active".to_string(),
                    code: None,
                    field: None,
                });
            }
            if event.tickets_left() < request.quantity {
                return Err(ApiError::Api {
                    status: 400,
                    message: format!("Only {} tickets left", event.tickets_left()),
                    code: None,
                    field: None,
                });
            }
            let total_price = event.ticket_price_regular * f64::from(request.quantity);

            let id = TicketId(inner.allocate_id());
            let submission = TicketSubmission {
                event_id: Some(event_id),
                buyer_name: request.buyer_name,
                phone: request.phone,
                email: request.email,
                reference_number: request.reference_number,
                total_price,
                attendee_names: request.attendee_names,
                payslip: Some(request.payslip),
            };
            let created_at = inner.now.unwrap_or_default();
            let ticket = ticket_from_submission(inner, id, event_id, created_at, &submission);

            inner.event_mut(event_id)?.sold_tickets += request.quantity;
            inner.tickets.push(ticket.clone());
            Ok(ticket)
        })
    }

    fn admin_events(&self) -> BackendFuture<Vec<Event>> {
        self.respond(BackendCall::AdminEvents, |inner| Ok(inner.events.clone()))
    }

    fn admin_event(&self, id: EventId) -> BackendFuture<Event> {
        self.respond(BackendCall::AdminEvent(id), move |inner| {
            inner.event(id).cloned()
        })
    }

    fn create_event(&self, draft: EventDraft, poster: Option<Upload>) -> BackendFuture<Event> {
        let call = BackendCall::CreateEvent {
            draft: draft.clone(),
            poster: poster.clone(),
        };
        self.respond(call, move |inner| {
            let event = event_from_draft(EventId(inner.allocate_id()), &draft, poster.as_ref());
            inner.events.push(event.clone());
            Ok(event)
        })
    }

    fn update_event(
        &self,
        id: EventId,
        draft: EventDraft,
        poster: Option<Upload>,
    ) -> BackendFuture<Event> {
        let call = BackendCall::UpdateEvent {
            id,
            draft: draft.clone(),
            poster: poster.clone(),
        };
        self.respond(call, move |inner| {
            let event = inner.event_mut(id)?;
            let mut updated = event_from_draft(id, &draft, poster.as_ref());
            updated.sold_tickets = event.sold_tickets;
            updated.walk_in_cash_count = event.walk_in_cash_count;
            updated.walk_in_gcash_count = event.walk_in_gcash_count;
            if updated.poster_image_url.is_none() {
                updated.poster_image_url.clone_from(&event.poster_image_url);
            }
            *event = updated.clone();
            Ok(updated)
        })
    }

    fn set_event_active(&self, id: EventId, is_active: bool) -> BackendFuture<Event> {
        self.respond(BackendCall::SetEventActive { id, is_active }, move |inner| {
            let event = inner.event_mut(id)?;
            event.is_active = is_active;
            Ok(event.clone())
        })
    }

    fn delete_event(&self, id: EventId) -> BackendFuture<()> {
        self.respond(BackendCall::DeleteEvent(id), move |inner| {
            inner.event(id)?;
            inner.events.retain(|e| e.id != id);
            inner.tickets.retain(|t| t.event_id != id);
            inner.attendees.remove(&id);
            Ok(())
        })
    }

    fn event_attendees(&self, id: EventId) -> BackendFuture<Vec<Attendee>> {
        self.respond(BackendCall::EventAttendees(id), move |inner| {
            inner.event(id)?;
            Ok(inner.attendees.get(&id).cloned().unwrap_or_default())
        })
    }

    fn toggle_check_in(&self, id: AttendeeId) -> BackendFuture<Attendee> {
        self.respond(BackendCall::ToggleCheckIn(id), move |inner| {
            let attendee = inner
                .attendees
                .values_mut()
                .flatten()
                .find(|a| a.id == id)
                .ok_or_else(|| not_found("Attendee not found"))?;
            attendee.checked_in = !attendee.checked_in;
            Ok(attendee.clone())
        })
    }

    fn walk_in_counts(&self, id: EventId) -> BackendFuture<WalkInCount> {
        self.respond(BackendCall::WalkInCounts(id), move |inner| {
            Ok(inner.event(id)?.walk_ins())
        })
    }

    fn adjust_walk_in(
        &self,
        id: EventId,
        payment_type: PaymentType,
        adjustment: WalkInAdjustment,
    ) -> BackendFuture<WalkInCount> {
        let call = BackendCall::AdjustWalkIn {
            id,
            payment_type,
            adjustment,
        };
        self.respond(call, move |inner| {
            let event = inner.event_mut(id)?;
            let counter = match payment_type {
                PaymentType::Cash => &mut event.walk_in_cash_count,
                PaymentType::Gcash => &mut event.walk_in_gcash_count,
            };
            *counter = match adjustment {
                WalkInAdjustment::Increment => *counter + 1,
                WalkInAdjustment::Decrement => counter.saturating_sub(1),
            };
            Ok(event.walk_ins())
        })
    }

    fn report(&self, id: EventId, kind: ReportKind) -> BackendFuture<Vec<u8>> {
        self.respond(BackendCall::Report { id, kind }, move |inner| {
            inner.event(id)?;
            Ok(inner
                .reports
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| b"%PDF-1.4\n".to_vec()))
        })
    }

    fn tickets(&self) -> BackendFuture<Vec<TicketPurchase>> {
        self.respond(BackendCall::Tickets, |inner| Ok(inner.tickets.clone()))
    }

    fn create_ticket(&self, submission: TicketSubmission) -> BackendFuture<TicketPurchase> {
        let call = BackendCall::CreateTicket(submission.clone());
        self.respond(call, move |inner| {
            let event_id = submission.event_id.ok_or_else(|| ApiError::Api {
                status: 400,
                message: "Validation failed: \"event_id\" is required".to_string(),
                code: None,
                field: Some("event_id".to_string()),
            })?;
            inner.event(event_id)?;

            let id = TicketId(inner.allocate_id());
            let created_at = inner.now.unwrap_or_default();
            let ticket = ticket_from_submission(inner, id, event_id, created_at, &submission);
            inner.tickets.push(ticket.clone());
            Ok(ticket)
        })
    }

    fn update_ticket(
        &self,
        id: TicketId,
        submission: TicketSubmission,
    ) -> BackendFuture<TicketPurchase> {
        let call = BackendCall::UpdateTicket {
            id,
            submission: submission.clone(),
        };
        self.respond(call, move |inner| {
            let existing = inner
                .tickets
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| not_found("Ticket not found"))?;

            let mut updated = ticket_from_submission(
                inner,
                id,
                existing.event_id,
                existing.created_at,
                &submission,
            );
            if submission.payslip.is_none() {
                updated.payslip_url = existing.payslip_url;
            }
            if let Some(slot) = inner.tickets.iter_mut().find(|t| t.id == id) {
                *slot = updated.clone();
            }
            Ok(updated)
        })
    }

    fn delete_ticket(&self, id: TicketId) -> BackendFuture<()> {
        self.respond(BackendCall::DeleteTicket(id), move |inner| {
            let before = inner.tickets.len();
            inner.tickets.retain(|t| t.id != id);
            if inner.tickets.len() == before {
                return Err(not_found("Ticket not found"));
            }
            Ok(())
        })
    }
}
