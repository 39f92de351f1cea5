//! Ticketing backend client implementation

use crate::{
    backend::{Backend, BackendFuture},
    error::{ApiError, ErrorBody},
    forms::{Credentials, FormFields, PurchaseRequest, TicketSubmission, Upload},
    types::{
        Attendee, AttendeeId, Event, EventDraft, EventId, LoginResponse, PageContent,
        PaymentType, ReportKind, TicketId, TicketPurchase, WalkInAdjustment, WalkInCount,
    },
};
use reqwest::{
    Client, Method, RequestBuilder, Response,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Backend base URL used when none is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api/v1";

/// Ticketing backend client
///
/// Holds a cookie jar, so the session cookie set by [`login`](Self::login)
/// is attached to every later request made through this client (or any of
/// its clones).
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    api_url: String,
}

impl BackendClient {
    /// Create a new client for the given API base URL (e.g. `http://host:3001/api/v1`)
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the HTTP client cannot be built
    pub fn new(api_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL all paths are appended to
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
    }

    /// Send a request and normalize non-2xx statuses into `ApiError`
    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let request = request
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        let method = request.method().clone();
        tracing::debug!(%method, path, "Sending backend request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_response(status.as_u16(), &body);
        tracing::warn!(%method, path, status = status.as_u16(), %error, "Backend request failed");
        Err(error)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path), path).await?;
        Self::json(response).await
    }

    fn multipart(fields: FormFields, file: Option<(&'static str, Upload)>) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (key, value) in fields {
            form = form.text(key, value);
        }

        if let Some((name, upload)) = file {
            let part = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.content_type)
                .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
            form = form.part(name, part);
        }

        Ok(form)
    }

    // --- Authentication ---

    /// Log in; the backend answers with a session cookie
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for rejected credentials, or
    /// `ApiError::Api` when the backend reports `success: false`
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let path = "/auth/login";
        let response = self
            .execute(self.request(Method::POST, path).json(credentials), path)
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<LoginResponse>(&body) {
            Ok(login) if !login.success => {
                let parsed = ErrorBody::parse(status, &body);
                let message = if parsed.message == format!("HTTP {status}") {
                    "Login failed".to_string()
                } else {
                    parsed.message
                };
                Err(ApiError::Api {
                    status,
                    message,
                    code: parsed.code,
                    field: parsed.field,
                })
            },
            _ => {
                tracing::info!(username = %credentials.username, "Logged in");
                Ok(())
            },
        }
    }

    /// Log out and drop the server-side session
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    pub async fn logout(&self) -> Result<(), ApiError> {
        let path = "/auth/logout";
        self.execute(self.request(Method::POST, path), path).await?;
        Ok(())
    }

    // --- Public routes ---

    /// All public events
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn public_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get_json("/public/events").await
    }

    /// One public event
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown events
    pub async fn public_event(&self, id: EventId) -> Result<Event, ApiError> {
        self.get_json(&format!("/public/events/{id}")).await
    }

    /// CMS text of a public page
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn public_page(&self, name: &str) -> Result<PageContent, ApiError> {
        self.get_json(&format!("/public/pages/{name}")).await
    }

    /// Buy tickets for an event
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` carrying the backend's validation message
    pub async fn purchase_tickets(
        &self,
        event_id: EventId,
        request: PurchaseRequest,
    ) -> Result<TicketPurchase, ApiError> {
        let path = format!("/public/events/{event_id}/purchase");
        let fields = request.form_fields();
        let form = Self::multipart(fields, Some(("payslip", request.payslip)))?;
        let response = self
            .execute(self.request(Method::POST, &path).multipart(form), &path)
            .await?;
        Self::json(response).await
    }

    // --- Admin: events ---

    /// All events, including inactive ones
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a valid session
    pub async fn admin_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get_json("/admin/events").await
    }

    /// One event with its admin-only fields
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::NotFound`
    pub async fn admin_event(&self, id: EventId) -> Result<Event, ApiError> {
        self.get_json(&format!("/admin/events/{id}")).await
    }

    /// Create and update both send `multipart/form-data`, with or without a poster
    async fn write_event(
        &self,
        method: Method,
        path: &str,
        draft: &EventDraft,
        poster: Option<Upload>,
    ) -> Result<Event, ApiError> {
        let form = Self::multipart(draft.form_fields(), poster.map(|p| ("poster", p)))?;
        let response = self
            .execute(self.request(method, path).multipart(form), path)
            .await?;
        Self::json(response).await
    }

    /// Create an event
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn create_event(
        &self,
        draft: &EventDraft,
        poster: Option<Upload>,
    ) -> Result<Event, ApiError> {
        self.write_event(Method::POST, "/admin/events", draft, poster)
            .await
    }

    /// Update the editable fields of an event
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn update_event(
        &self,
        id: EventId,
        draft: &EventDraft,
        poster: Option<Upload>,
    ) -> Result<Event, ApiError> {
        self.write_event(Method::PATCH, &format!("/admin/events/{id}"), draft, poster)
            .await
    }

    /// Activate or deactivate an event
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn set_event_active(&self, id: EventId, is_active: bool) -> Result<Event, ApiError> {
        let path = format!("/admin/events/{id}");
        let response = self
            .execute(
                self.request(Method::PATCH, &path)
                    .json(&json!({ "is_active": is_active })),
                &path,
            )
            .await?;
        Self::json(response).await
    }

    /// Delete an event with all its tickets
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    pub async fn delete_event(&self, id: EventId) -> Result<(), ApiError> {
        let path = format!("/admin/events/{id}");
        self.execute(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }

    // --- Admin: door ---

    /// Every attendee of an event
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn event_attendees(&self, id: EventId) -> Result<Vec<Attendee>, ApiError> {
        self.get_json(&format!("/admin/events/{id}/attendees")).await
    }

    /// Flip an attendee's check-in flag
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn toggle_check_in(&self, id: AttendeeId) -> Result<Attendee, ApiError> {
        let path = format!("/admin/attendees/{id}/check-in");
        let response = self
            .execute(self.request(Method::PATCH, &path), &path)
            .await?;
        Self::json(response).await
    }

    /// Current walk-in counters
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn walk_in_counts(&self, id: EventId) -> Result<WalkInCount, ApiError> {
        self.get_json(&format!("/admin/events/{id}/walk-ins")).await
    }

    /// Increment or decrement one walk-in counter
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn adjust_walk_in(
        &self,
        id: EventId,
        payment_type: PaymentType,
        adjustment: WalkInAdjustment,
    ) -> Result<WalkInCount, ApiError> {
        let path = format!("/admin/events/{id}/walk-ins/{}", adjustment.path());
        let response = self
            .execute(
                self.request(Method::POST, &path)
                    .json(&json!({ "payment_type": payment_type })),
                &path,
            )
            .await?;
        Self::json(response).await
    }

    /// Download a PDF report
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    pub async fn report(&self, id: EventId, kind: ReportKind) -> Result<Vec<u8>, ApiError> {
        let path = format!("/admin/events/{id}/{}", kind.path());
        let response = self
            .execute(
                self.request(Method::GET, &path)
                    .header(reqwest::header::ACCEPT, "application/pdf"),
                &path,
            )
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    // --- Admin: tickets ---

    /// Every ticket purchase across all events
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn tickets(&self) -> Result<Vec<TicketPurchase>, ApiError> {
        self.get_json("/admin/tickets").await
    }

    async fn write_ticket(
        &self,
        method: Method,
        path: &str,
        submission: TicketSubmission,
    ) -> Result<TicketPurchase, ApiError> {
        let fields = submission.form_fields();
        let form = Self::multipart(fields, submission.payslip.map(|p| ("payslip", p)))?;
        let response = self
            .execute(self.request(method, path).multipart(form), path)
            .await?;
        Self::json(response).await
    }

    /// Record a ticket purchase on behalf of a buyer
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` carrying the backend's validation message
    pub async fn create_ticket(
        &self,
        submission: TicketSubmission,
    ) -> Result<TicketPurchase, ApiError> {
        self.write_ticket(Method::POST, "/admin/tickets", submission)
            .await
    }

    /// Update a ticket purchase
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` carrying the backend's validation message
    pub async fn update_ticket(
        &self,
        id: TicketId,
        submission: TicketSubmission,
    ) -> Result<TicketPurchase, ApiError> {
        self.write_ticket(Method::PATCH, &format!("/admin/tickets/{id}"), submission)
            .await
    }

    /// Delete a ticket purchase
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    pub async fn delete_ticket(&self, id: TicketId) -> Result<(), ApiError> {
        let path = format!("/admin/tickets/{id}");
        self.execute(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }
}

impl Backend for BackendClient {
    fn login(&self, credentials: Credentials) -> BackendFuture<()> {
        let this = self.clone();
        Box::pin(async move { this.login(&credentials).await })
    }

    fn logout(&self) -> BackendFuture<()> {
        let this = self.clone();
        Box::pin(async move { this.logout().await })
    }

    fn public_events(&self) -> BackendFuture<Vec<Event>> {
        let this = self.clone();
        Box::pin(async move { this.public_events().await })
    }

    fn public_event(&self, id: EventId) -> BackendFuture<Event> {
        let this = self.clone();
        Box::pin(async move { this.public_event(id).await })
    }

    fn public_page(&self, name: String) -> BackendFuture<PageContent> {
        let this = self.clone();
        Box::pin(async move { this.public_page(&name).await })
    }

    fn purchase_tickets(
        &self,
        event_id: EventId,
        request: PurchaseRequest,
    ) -> BackendFuture<TicketPurchase> {
        let this = self.clone();
        Box::pin(async move { this.purchase_tickets(event_id, request).await })
    }

    fn admin_events(&self) -> BackendFuture<Vec<Event>> {
        let this = self.clone();
        Box::pin(async move { this.admin_events().await })
    }

    fn admin_event(&self, id: EventId) -> BackendFuture<Event> {
        let this = self.clone();
        Box::pin(async move { this.admin_event(id).await })
    }

    fn create_event(&self, draft: EventDraft, poster: Option<Upload>) -> BackendFuture<Event> {
        let this = self.clone();
        Box::pin(async move { this.create_event(&draft, poster).await })
    }

    fn update_event(
        &self,
        id: EventId,
        draft: EventDraft,
        poster: Option<Upload>,
    ) -> BackendFuture<Event> {
        let this = self.clone();
        Box::pin(async move { this.update_event(id, &draft, poster).await })
    }

    fn set_event_active(&self, id: EventId, is_active: bool) -> BackendFuture<Event> {
        let this = self.clone();
        Box::pin(async move { this.set_event_active(id, is_active).await })
    }

    fn delete_event(&self, id: EventId) -> BackendFuture<()> {
        let this = self.clone();
        Box::pin(async move { this.delete_event(id).await })
    }

    fn event_attendees(&self, id: EventId) -> BackendFuture<Vec<Attendee>> {
        let this = self.clone();
        Box::pin(async move { this.event_attendees(id).await })
    }

    fn toggle_check_in(&self, id: AttendeeId) -> BackendFuture<Attendee> {
        let this = self.clone();
        Box::pin(async move { this.toggle_check_in(id).await })
    }

    fn walk_in_counts(&self, id: EventId) -> BackendFuture<WalkInCount> {
        let this = self.clone();
        Box::pin(async move { this.walk_in_counts(id).await })
    }

    fn adjust_walk_in(
        &self,
        id: EventId,
        payment_type: PaymentType,
        adjustment: WalkInAdjustment,
    ) -> BackendFuture<WalkInCount> {
        let this = self.clone();
        Box::pin(async move { this.adjust_walk_in(id, payment_type, adjustment).await })
    }

    fn report(&self, id: EventId, kind: ReportKind) -> BackendFuture<Vec<u8>> {
        let this = self.clone();
        Box::pin(async move { this.report(id, kind).await })
    }

    fn tickets(&self) -> BackendFuture<Vec<TicketPurchase>> {
        let this = self.clone();
        Box::pin(async move { this.tickets().await })
    }

    fn create_ticket(&self, submission: TicketSubmission) -> BackendFuture<TicketPurchase> {
        let this = self.clone();
        Box::pin(async move { this.create_ticket(submission).await })
    }

    fn update_ticket(
        &self,
        id: TicketId,
        submission: TicketSubmission,
    ) -> BackendFuture<TicketPurchase> {
        let this = self.clone();
        Box::pin(async move { this.update_ticket(id, submission).await })
    }

    fn delete_ticket(&self, id: TicketId) -> BackendFuture<()> {
        let this = self.clone();
        Box::pin(async move { this.delete_ticket(id).await })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_trailing_slash() {
        let client = BackendClient::new("http://localhost:3001/api/v1/").unwrap();
        assert_eq!(client.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_multipart_accepts_known_mime() {
        let upload = Upload::new("payslip.png", "image/png", vec![1, 2, 3]);
        let form = BackendClient::multipart(
            vec![("buyer_name".to_string(), "Lance".to_string())],
            Some(("payslip", upload)),
        );
        assert!(form.is_ok());
    }

    #[test]
    fn test_multipart_rejects_invalid_mime() {
        let upload = Upload::new("payslip.png", "not a mime", vec![]);
        let form = BackendClient::multipart(Vec::new(), Some(("payslip", upload)));
        assert!(matches!(form, Err(ApiError::RequestFailed(_))));
    }
}
