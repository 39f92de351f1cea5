//! The backend seam
//!
//! Pages reach the ticketing backend only through this trait, so reducers
//! can be driven by [`BackendClient`](crate::BackendClient) in production and
//! by an in-memory double in tests.

use crate::error::ApiError;
use crate::forms::{Credentials, PurchaseRequest, TicketSubmission, Upload};
use crate::types::{
    Attendee, AttendeeId, Event, EventDraft, EventId, PageContent, PaymentType, ReportKind,
    TicketId, TicketPurchase, WalkInAdjustment, WalkInCount,
};
use futures::future::BoxFuture;

/// Result future returned by every backend call
pub type BackendFuture<T> = BoxFuture<'static, Result<T, ApiError>>;

/// Every endpoint of the ticketing backend used by the client
pub trait Backend: Send + Sync {
    /// `POST /auth/login` - establishes the session cookie
    fn login(&self, credentials: Credentials) -> BackendFuture<()>;

    /// `POST /auth/logout`
    fn logout(&self) -> BackendFuture<()>;

    /// `GET /public/events`
    fn public_events(&self) -> BackendFuture<Vec<Event>>;

    /// `GET /public/events/:id`
    fn public_event(&self, id: EventId) -> BackendFuture<Event>;

    /// `GET /public/pages/:name`
    fn public_page(&self, name: String) -> BackendFuture<PageContent>;

    /// `POST /public/events/:id/purchase` (multipart)
    fn purchase_tickets(
        &self,
        event_id: EventId,
        request: PurchaseRequest,
    ) -> BackendFuture<TicketPurchase>;

    /// `GET /admin/events`
    fn admin_events(&self) -> BackendFuture<Vec<Event>>;

    /// `GET /admin/events/:id`
    fn admin_event(&self, id: EventId) -> BackendFuture<Event>;

    /// `POST /admin/events` (multipart when a poster is attached)
    fn create_event(&self, draft: EventDraft, poster: Option<Upload>) -> BackendFuture<Event>;

    /// `PATCH /admin/events/:id` (multipart when a poster is attached)
    fn update_event(
        &self,
        id: EventId,
        draft: EventDraft,
        poster: Option<Upload>,
    ) -> BackendFuture<Event>;

    /// `PATCH /admin/events/:id` with `{is_active}`
    fn set_event_active(&self, id: EventId, is_active: bool) -> BackendFuture<Event>;

    /// `DELETE /admin/events/:id`
    fn delete_event(&self, id: EventId) -> BackendFuture<()>;

    /// `GET /admin/events/:id/attendees`
    fn event_attendees(&self, id: EventId) -> BackendFuture<Vec<Attendee>>;

    /// `PATCH /admin/attendees/:id/check-in`
    fn toggle_check_in(&self, id: AttendeeId) -> BackendFuture<Attendee>;

    /// `GET /admin/events/:id/walk-ins`
    fn walk_in_counts(&self, id: EventId) -> BackendFuture<WalkInCount>;

    /// `POST /admin/events/:id/walk-ins/{increment,decrement}`
    fn adjust_walk_in(
        &self,
        id: EventId,
        payment_type: PaymentType,
        adjustment: WalkInAdjustment,
    ) -> BackendFuture<WalkInCount>;

    /// `GET /admin/events/:id/{attendee-list,accounting,email-list}` - PDF bytes
    fn report(&self, id: EventId, kind: ReportKind) -> BackendFuture<Vec<u8>>;

    /// `GET /admin/tickets`
    fn tickets(&self) -> BackendFuture<Vec<TicketPurchase>>;

    /// `POST /admin/tickets` (multipart)
    fn create_ticket(&self, submission: TicketSubmission) -> BackendFuture<TicketPurchase>;

    /// `PATCH /admin/tickets/:id` (multipart)
    fn update_ticket(
        &self,
        id: TicketId,
        submission: TicketSubmission,
    ) -> BackendFuture<TicketPurchase>;

    /// `DELETE /admin/tickets/:id`
    fn delete_ticket(&self, id: TicketId) -> BackendFuture<()>;
}
