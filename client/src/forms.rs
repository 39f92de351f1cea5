//! Request payloads and their multipart encoding
//!
//! Write endpoints that carry files (payslips, posters) or attendee lists take
//! `multipart/form-data`. Each payload knows its own text fields; the client
//! turns them into a `reqwest::multipart::Form` and appends the file part.

use crate::types::{EventDraft, EventId};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Ordered text fields of a multipart body
pub type FormFields = Vec<(String, String)>;

/// A file picked for upload (payslip image or event poster)
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name sent in the part's `Content-Disposition`
    pub file_name: String,
    /// MIME type of the part
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Create an upload from in-memory bytes
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        let content_type = guess_content_type(&file_name).to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Admin login credentials
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct Credentials {
    /// Admin username
    pub username: String,
    /// Admin password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Append `attendees[i][name]` keys in attendee order
fn push_attendees(fields: &mut FormFields, names: &[String]) {
    for (index, name) in names.iter().enumerate() {
        fields.push((format!("attendees[{index}][name]"), name.clone()));
    }
}

/// Create or update body of the admin ticket endpoints
#[derive(Clone, Debug, PartialEq)]
pub struct TicketSubmission {
    /// Event the ticket belongs to; only sent on create
    pub event_id: Option<EventId>,
    /// Buyer name
    pub buyer_name: String,
    /// Buyer phone
    pub phone: String,
    /// Buyer email
    pub email: String,
    /// Payment reference number
    pub reference_number: String,
    /// Amount paid
    pub total_price: f64,
    /// Attendee names in order; index 0 is the buyer
    pub attendee_names: Vec<String>,
    /// Proof of payment; required on create, optional on update
    pub payslip: Option<Upload>,
}

impl TicketSubmission {
    /// Text fields of the multipart body
    #[must_use]
    pub fn form_fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        if let Some(event_id) = self.event_id {
            fields.push(("event_id".to_string(), event_id.to_string()));
        }
        fields.push(("buyer_name".to_string(), self.buyer_name.clone()));
        fields.push(("phone".to_string(), self.phone.clone()));
        fields.push(("email".to_string(), self.email.clone()));
        fields.push(("reference_number".to_string(), self.reference_number.clone()));
        fields.push(("total_price".to_string(), self.total_price.to_string()));
        push_attendees(&mut fields, &self.attendee_names);
        fields
    }
}

/// Body of the public purchase endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseRequest {
    /// Number of tickets; equals the number of attendees
    pub quantity: u32,
    /// Buyer name
    pub buyer_name: String,
    /// Buyer phone
    pub phone: String,
    /// Buyer email
    pub email: String,
    /// Payment reference number
    pub reference_number: String,
    /// Attendee names in order
    pub attendee_names: Vec<String>,
    /// Proof of payment
    pub payslip: Upload,
}

impl PurchaseRequest {
    /// Text fields of the multipart body
    #[must_use]
    pub fn form_fields(&self) -> FormFields {
        let mut fields = vec![
            ("quantity".to_string(), self.quantity.to_string()),
            ("buyer_name".to_string(), self.buyer_name.clone()),
            ("phone".to_string(), self.phone.clone()),
            ("email".to_string(), self.email.clone()),
            ("reference_number".to_string(), self.reference_number.clone()),
        ];
        push_attendees(&mut fields, &self.attendee_names);
        fields
    }
}

impl EventDraft {
    /// Text fields of the multipart create/update body
    ///
    /// Cleared bundle fields are sent as the literal `null`.
    #[must_use]
    pub fn form_fields(&self) -> FormFields {
        fn optional<T: ToString>(value: Option<T>) -> String {
            value.map_or_else(|| "null".to_string(), |v| v.to_string())
        }

        let mut fields = vec![
            ("title", self.title.clone()),
            ("display_date", self.display_date.clone()),
            ("venue_name", self.venue_name.clone()),
            ("venue_address", self.venue_address.clone()),
            ("event_time", self.event_time.clone()),
            ("description", self.description.clone()),
            ("email_template_content", self.email_template_content.clone()),
            ("ticket_price_regular", self.ticket_price_regular.to_string()),
            ("ticket_price_bundle", optional(self.ticket_price_bundle)),
            ("bundle_size", optional(self.bundle_size)),
            ("max_tickets", self.max_tickets.to_string()),
            ("ticket_deadline", self.ticket_deadline.clone()),
            ("is_active", self.is_active.to_string()),
            ("start_date", self.start_date.format("%Y-%m-%d").to_string()),
            ("walk_in_price", self.walk_in_price.to_string()),
        ];
        if let Some(message) = &self.inactive_message {
            fields.push(("inactive_message", message.clone()));
        }

        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn value<'a>(fields: &'a FormFields, key: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_ticket_fields_index_attendees() {
        let submission = TicketSubmission {
            event_id: Some(EventId(5)),
            buyer_name: "Lance".to_string(),
            phone: "0917".to_string(),
            email: "lance@example.com".to_string(),
            reference_number: "REF-1".to_string(),
            total_price: 1000.0,
            attendee_names: vec!["Lance".to_string(), "Bea".to_string()],
            payslip: None,
        };

        let fields = submission.form_fields();
        assert_eq!(value(&fields, "event_id"), Some("5"));
        assert_eq!(value(&fields, "attendees[0][name]"), Some("Lance"));
        assert_eq!(value(&fields, "attendees[1][name]"), Some("Bea"));
        assert_eq!(value(&fields, "total_price"), Some("1000"));
    }

    #[test]
    fn test_ticket_update_omits_event_id() {
        let submission = TicketSubmission {
            event_id: None,
            buyer_name: "Lance".to_string(),
            phone: String::new(),
            email: String::new(),
            reference_number: String::new(),
            total_price: 0.0,
            attendee_names: vec!["Lance".to_string()],
            payslip: None,
        };

        assert!(value(&submission.form_fields(), "event_id").is_none());
    }

    #[test]
    fn test_draft_fields_send_null_for_cleared_bundle() {
        let draft = EventDraft {
            title: "Elephant".to_string(),
            display_date: String::new(),
            venue_name: String::new(),
            venue_address: String::new(),
            event_time: String::new(),
            description: String::new(),
            email_template_content: String::new(),
            ticket_price_regular: 100.0,
            ticket_price_bundle: None,
            bundle_size: None,
            max_tickets: 100,
            ticket_deadline: "2025-06-27".to_string(),
            is_active: false,
            inactive_message: None,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 28).unwrap(),
            walk_in_price: 120.0,
        };

        let fields = draft.form_fields();
        assert_eq!(value(&fields, "ticket_price_bundle"), Some("null"));
        assert_eq!(value(&fields, "bundle_size"), Some("null"));
        assert_eq!(value(&fields, "start_date"), Some("2025-06-28"));
        assert!(value(&fields, "sold_tickets").is_none());
        assert!(value(&fields, "id").is_none());
    }

    #[test]
    fn test_upload_guesses_content_type() {
        assert_eq!(guess_content_type("payslip.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("poster.webp"), "image/webp");
        assert_eq!(guess_content_type("noextension"), "application/octet-stream");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
