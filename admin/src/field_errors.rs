//! Field-level form errors and their derivation from backend failures
//!
//! The backend reports most validation failures as prose. When it includes a
//! machine-readable `code` or `field` those are used directly; otherwise the
//! message is matched against the phrases the backend is known to produce.
//! Every rule that matches contributes, so one message can flag several
//! fields.

use elephant_client::ApiError;
use std::collections::BTreeMap;
use std::fmt;

/// Form slots an error can be attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Not tied to one input
    General,
    /// Buyer name
    BuyerName,
    /// Buyer email
    Email,
    /// Buyer phone
    Phone,
    /// Payment reference number
    ReferenceNumber,
    /// Amount paid
    TotalPrice,
    /// Attendee names
    Attendees,
    /// Proof of payment upload
    Payslip,
}

impl Field {
    /// Map a backend field name onto a form slot
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "buyer_name" => Some(Self::BuyerName),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "reference_number" => Some(Self::ReferenceNumber),
            "total_price" => Some(Self::TotalPrice),
            "payslip" => Some(Self::Payslip),
            name if name == "attendees" || name.starts_with("attendees[") => {
                Some(Self::Attendees)
            },
            _ => None,
        }
    }

    /// Human label used when rendering the error
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "error",
            Self::BuyerName => "buyer name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::ReferenceNumber => "reference number",
            Self::TotalPrice => "total price",
            Self::Attendees => "attendees",
            Self::Payslip => "payslip",
        }
    }
}

/// Messages keyed by form slot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<Field, String>,
}

const UNEXPECTED: &str = "An unexpected error occurred";

/// General message for a save that never got a usable backend answer
pub const SAVE_FAILED: &str = "Failed to save ticket. Please try again.";

impl FieldErrors {
    /// No errors
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }

    /// A single general error
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.set(Field::General, message);
        errors
    }

    /// Attach (or replace) the message of one slot
    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    /// Drop the message of one slot
    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    /// Message of one slot
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Whether no slot has an error
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of slots with an error
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Slots and messages in form order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// Derive field errors from a failed ticket write
    #[must_use]
    pub fn from_api_error(error: &ApiError) -> Self {
        if matches!(
            error,
            ApiError::RequestFailed(_) | ApiError::ResponseParseFailed(_)
        ) {
            return Self::general(SAVE_FAILED);
        }

        if let ApiError::Api {
            message,
            code,
            field,
            ..
        } = error
        {
            if let Some(errors) = Self::from_structured(message, code.as_deref(), field.as_deref())
            {
                return errors;
            }
        }

        Self::from_message(error.server_message())
    }

    fn from_structured(message: &str, code: Option<&str>, field: Option<&str>) -> Option<Self> {
        let mut errors = Self::new();

        match code {
            Some("DUPLICATE_EMAIL") => {
                errors.set(Field::Email, "This email has already been used for this event");
            },
            Some("DUPLICATE_REFERENCE") => errors.set(
                Field::ReferenceNumber,
                "This reference number has already been used for this event",
            ),
            Some("EVENT_NOT_FOUND") => {
                errors.set(Field::General, "This event is no longer available");
            },
            Some("EVENT_INACTIVE") => errors.set(Field::General, "This event is no longer active"),
            Some("SOLD_OUT") => errors.set(Field::General, message),
            Some("PAYSLIP_REQUIRED") => errors.set(Field::Payslip, "Payslip upload is required"),
            _ => {
                let field = field.and_then(Field::from_name)?;
                errors.set(field, message);
            },
        }

        Some(errors)
    }

    /// Derive field errors by matching known backend phrases
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let mut errors = Self::new();
        let has = |needle: &str| message.contains(needle);

        if has("Email already used") || has("Duplicate email") {
            errors.set(Field::Email, "This email has already been used for this event");
        }

        if has("Reference number already used") || has("Duplicate reference") {
            errors.set(
                Field::ReferenceNumber,
                "This reference number has already been used for this event",
            );
        }

        if has("not found") {
            errors.set(Field::General, "This event is no longer available");
        }

        if has("not active") {
            errors.set(Field::General, "This event is no longer active");
        }

        if has("tickets left") || has("sold out") {
            errors.set(Field::General, message);
        }

        if has("attendees") || has("Attendees") {
            let attendee_message = if has("count must match") {
                "Number of attendees must match ticket quantity"
            } else if has("Invalid attendees format") {
                "Invalid attendee format"
            } else if has("At least one attendee is required") {
                "At least one attendee is required"
            } else {
                "Please check attendee information"
            };
            errors.set(Field::Attendees, attendee_message);
        }

        if has("Payslip") || has("payslip") {
            let payslip_message = if has("upload is required") {
                "Payslip upload is required"
            } else {
                "Please upload a valid payslip image (JPEG, PNG, WebP)"
            };
            errors.set(Field::Payslip, payslip_message);
        }

        if has("File type") || has("file type") || has("Failed to upload") {
            errors.set(Field::Payslip, message);
        }

        if has("Validation failed") {
            let per_field = [
                ("email", Field::Email, "Please enter a valid email address"),
                ("phone", Field::Phone, "Please enter a valid phone number"),
                ("buyer_name", Field::BuyerName, "Please enter a valid name"),
                (
                    "reference_number",
                    Field::ReferenceNumber,
                    "Please enter a valid reference number",
                ),
                ("total_price", Field::TotalPrice, "Please enter a valid price"),
            ];
            for (name, field, field_message) in per_field {
                if has(name) {
                    errors.set(field, field_message);
                }
            }
        }

        if errors.is_empty() {
            let fallback = if message.trim().is_empty() {
                UNEXPECTED
            } else {
                message
            };
            errors.set(Field::General, fallback);
        }

        errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            match field {
                Field::General => f.write_str(message)?,
                other => write!(f, "{}: {message}", other.label())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_targets_email() {
        let errors = FieldErrors::from_message("Email already used for this event");
        assert_eq!(
            errors.get(Field::Email),
            Some("This email has already been used for this event")
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_duplicate_reference_targets_reference() {
        let errors = FieldErrors::from_message("Duplicate reference number");
        assert!(errors.get(Field::ReferenceNumber).is_some());
    }

    #[test]
    fn test_inactive_overrides_not_found_in_general() {
        let errors = FieldErrors::from_message("Event not found");
        assert_eq!(errors.get(Field::General), Some("This event is no longer available"));

        let errors = FieldErrors::from_message("Event is not active");
        assert_eq!(errors.get(Field::General), Some("This event is no longer active"));
    }

    #[test]
    fn test_sold_out_keeps_backend_text() {
        let errors = FieldErrors::from_message("Only 2 tickets left");
        assert_eq!(errors.get(Field::General), Some("Only 2 tickets left"));
    }

    #[test]
    fn test_attendee_messages() {
        assert_eq!(
            FieldErrors::from_message("attendees count must match quantity").get(Field::Attendees),
            Some("Number of attendees must match ticket quantity")
        );
        assert_eq!(
            FieldErrors::from_message("Invalid attendees format").get(Field::Attendees),
            Some("Invalid attendee format")
        );
        assert_eq!(
            FieldErrors::from_message("Attendees: something odd").get(Field::Attendees),
            Some("Please check attendee information")
        );
    }

    #[test]
    fn test_payslip_and_file_type_messages() {
        assert_eq!(
            FieldErrors::from_message("Payslip upload is required").get(Field::Payslip),
            Some("Payslip upload is required")
        );
        assert_eq!(
            FieldErrors::from_message("Invalid payslip").get(Field::Payslip),
            Some("Please upload a valid payslip image (JPEG, PNG, WebP)")
        );
        assert_eq!(
            FieldErrors::from_message("File type not allowed").get(Field::Payslip),
            Some("File type not allowed")
        );
    }

    #[test]
    fn test_validation_failed_flags_every_named_field() {
        let errors = FieldErrors::from_message(
            "Validation failed: \"email\" must be a valid email, \"phone\" is required",
        );
        assert_eq!(errors.get(Field::Email), Some("Please enter a valid email address"));
        assert_eq!(errors.get(Field::Phone), Some("Please enter a valid phone number"));
        assert!(errors.get(Field::General).is_none());
    }

    #[test]
    fn test_unknown_message_falls_back_to_general() {
        assert_eq!(
            FieldErrors::from_message("Teapot").get(Field::General),
            Some("Teapot")
        );
        assert_eq!(
            FieldErrors::from_message("").get(Field::General),
            Some("An unexpected error occurred")
        );
    }

    #[test]
    fn test_structured_code_wins_over_prose() {
        let error = ApiError::Api {
            status: 409,
            message: "Conflict".to_string(),
            code: Some("DUPLICATE_EMAIL".to_string()),
            field: None,
        };
        let errors = FieldErrors::from_api_error(&error);
        assert!(errors.get(Field::Email).is_some());
        assert!(errors.get(Field::General).is_none());
    }

    #[test]
    fn test_structured_field_uses_backend_message() {
        let error = ApiError::Api {
            status: 400,
            message: "must be a valid phone number".to_string(),
            code: Some("VALIDATION".to_string()),
            field: Some("phone".to_string()),
        };
        let errors = FieldErrors::from_api_error(&error);
        assert_eq!(errors.get(Field::Phone), Some("must be a valid phone number"));
    }

    #[test]
    fn test_unstructured_api_error_uses_prose() {
        let error = ApiError::Api {
            status: 400,
            message: "Email already used for this event".to_string(),
            code: None,
            field: None,
        };
        assert!(FieldErrors::from_api_error(&error).get(Field::Email).is_some());
    }

    #[test]
    fn test_transport_failure_hides_client_error_text() {
        let errors = FieldErrors::from_api_error(&ApiError::RequestFailed(
            "error sending request: Attendees not active".to_string(),
        ));
        assert_eq!(errors.get(Field::General), Some(SAVE_FAILED));
        assert_eq!(errors.len(), 1);

        let errors =
            FieldErrors::from_api_error(&ApiError::ResponseParseFailed("EOF".to_string()));
        assert_eq!(errors.get(Field::General), Some(SAVE_FAILED));
    }

    #[test]
    fn test_clear_drops_only_one_slot() {
        let mut errors = FieldErrors::general("Nope");
        errors.set(Field::Attendees, "Cannot remove the buyer");
        errors.clear(Field::Attendees);
        assert_eq!(errors, FieldErrors::general("Nope"));
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = FieldErrors::general("Nope");
        errors.set(Field::Email, "bad");
        assert_eq!(errors.to_string(), "Nope; email: bad");
    }
}
