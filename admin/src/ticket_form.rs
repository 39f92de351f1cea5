//! Buyer and attendee form state shared by the ticket desk and public purchase
//!
//! Attendee 0 is the buyer: editing the buyer name rewrites attendee 0 and
//! editing attendee 0 rewrites the buyer name. Other attendees never touch
//! the buyer name.

use crate::field_errors::{Field, FieldErrors};
use elephant_client::{EventId, PurchaseRequest, TicketId, TicketPurchase, TicketSubmission, Upload};
use thiserror::Error;

/// Rejected attendee list edits
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    /// Attendee 0 is the buyer and cannot be removed
    #[error("The first attendee is the buyer and cannot be removed")]
    CannotRemoveBuyer,

    /// At least one attendee must remain
    #[error("At least one attendee is required")]
    LastAttendee,

    /// Index out of range
    #[error("There is no attendee #{0}")]
    NoSuchAttendee(usize),
}

/// Buyer name plus ordered attendee names, kept in sync at index 0
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttendeeNames {
    buyer_name: String,
    attendees: Vec<String>,
}

impl Default for AttendeeNames {
    fn default() -> Self {
        Self {
            buyer_name: String::new(),
            attendees: vec![String::new()],
        }
    }
}

impl AttendeeNames {
    /// Start from a buyer and their attendee list
    ///
    /// Attendee 0 is forced to the buyer name; an empty list gets the buyer.
    #[must_use]
    pub fn new(buyer_name: impl Into<String>, attendees: Vec<String>) -> Self {
        let buyer_name = buyer_name.into();
        let mut attendees = attendees;
        match attendees.first_mut() {
            Some(first) => first.clone_from(&buyer_name),
            None => attendees.push(buyer_name.clone()),
        }
        Self {
            buyer_name,
            attendees,
        }
    }

    /// Buyer name
    #[must_use]
    pub fn buyer_name(&self) -> &str {
        &self.buyer_name
    }

    /// Attendee names in order
    #[must_use]
    pub fn attendees(&self) -> &[String] {
        &self.attendees
    }

    /// Edit the buyer name; attendee 0 follows
    pub fn set_buyer_name(&mut self, name: impl Into<String>) {
        self.buyer_name = name.into();
        match self.attendees.first_mut() {
            Some(first) => first.clone_from(&self.buyer_name),
            None => self.attendees.push(self.buyer_name.clone()),
        }
    }

    /// Edit one attendee; index 0 also rewrites the buyer name
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NoSuchAttendee`] when `index` is out of range.
    pub fn set_attendee(&mut self, index: usize, name: impl Into<String>) -> Result<(), FormError> {
        let slot = self
            .attendees
            .get_mut(index)
            .ok_or(FormError::NoSuchAttendee(index))?;
        *slot = name.into();
        if index == 0 {
            self.buyer_name.clone_from(slot);
        }
        Ok(())
    }

    /// Append an empty attendee
    pub fn add_attendee(&mut self) {
        self.attendees.push(String::new());
    }

    /// Remove one attendee
    ///
    /// # Errors
    ///
    /// Index 0 can never be removed, and the last remaining attendee can
    /// never be removed.
    pub fn remove_attendee(&mut self, index: usize) -> Result<(), FormError> {
        if index == 0 {
            return Err(FormError::CannotRemoveBuyer);
        }
        if self.attendees.len() <= 1 {
            return Err(FormError::LastAttendee);
        }
        if index >= self.attendees.len() {
            return Err(FormError::NoSuchAttendee(index));
        }
        self.attendees.remove(index);
        Ok(())
    }
}

/// Contact fields shared by both forms
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contact {
    /// Buyer phone
    pub phone: String,
    /// Buyer email
    pub email: String,
    /// Payment reference number
    pub reference_number: String,
}

impl Contact {
    fn validate(&self, errors: &mut FieldErrors) {
        if self.phone.trim().is_empty() {
            errors.set(Field::Phone, "Phone is required");
        }
        if self.email.trim().is_empty() {
            errors.set(Field::Email, "Email is required");
        } else if !self.email.contains('@') {
            errors.set(Field::Email, "Please enter a valid email address");
        }
        if self.reference_number.trim().is_empty() {
            errors.set(Field::ReferenceNumber, "Reference number is required");
        }
    }
}

fn validate_names(names: &AttendeeNames, errors: &mut FieldErrors) {
    if names.buyer_name.trim().is_empty() {
        errors.set(Field::BuyerName, "Buyer name is required");
    }
    if names.attendees.iter().any(|n| n.trim().is_empty()) {
        errors.set(Field::Attendees, "All attendee names are required");
    }
}

/// Admin create/edit form for one ticket purchase
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TicketForm {
    /// Buyer and attendees
    pub names: AttendeeNames,
    /// Contact fields
    pub contact: Contact,
    /// Amount paid, as typed
    pub total_price: String,
    /// Newly picked proof of payment
    pub payslip: Option<Upload>,
    /// Ticket being edited; `None` while creating
    pub editing: Option<TicketId>,
}

impl TicketForm {
    /// Empty create form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit form pre-filled from an existing purchase
    #[must_use]
    pub fn edit(ticket: &TicketPurchase) -> Self {
        Self {
            names: AttendeeNames::new(
                ticket.buyer_name.clone(),
                ticket.attendees.iter().map(|a| a.name.clone()).collect(),
            ),
            contact: Contact {
                phone: ticket.phone.clone(),
                email: ticket.email.clone(),
                reference_number: ticket.reference_number.clone(),
            },
            total_price: ticket.total_price.to_string(),
            payslip: None,
            editing: Some(ticket.id),
        }
    }

    /// Check every field before anything is sent
    ///
    /// On success returns the submission for `event_id`; the event id is
    /// only included when creating.
    ///
    /// # Errors
    ///
    /// Returns the errors of every invalid field.
    pub fn validate(&self, event_id: EventId) -> Result<TicketSubmission, FieldErrors> {
        let mut errors = FieldErrors::new();
        validate_names(&self.names, &mut errors);
        self.contact.validate(&mut errors);

        let total_price = self
            .total_price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0);
        if total_price.is_none() {
            errors.set(Field::TotalPrice, "Please enter a valid price");
        }

        if self.editing.is_none() && self.payslip.is_none() {
            errors.set(Field::Payslip, "Payslip is required for new tickets");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TicketSubmission {
            event_id: self.editing.is_none().then_some(event_id),
            buyer_name: self.names.buyer_name.clone(),
            phone: self.contact.phone.clone(),
            email: self.contact.email.clone(),
            reference_number: self.contact.reference_number.clone(),
            total_price: total_price.unwrap_or_default(),
            attendee_names: self.names.attendees.clone(),
            payslip: self.payslip.clone(),
        })
    }
}

/// Public purchase form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PurchaseForm {
    /// Buyer and attendees
    pub names: AttendeeNames,
    /// Contact fields
    pub contact: Contact,
    /// Proof of payment
    pub payslip: Option<Upload>,
}

impl PurchaseForm {
    /// Attendee names that were filled in
    #[must_use]
    pub fn named_attendees(&self) -> Vec<String> {
        self.names
            .attendees
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check every field; blank extra attendees are dropped, not rejected
    ///
    /// # Errors
    ///
    /// Returns the errors of every invalid field.
    pub fn validate(&self) -> Result<PurchaseRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.names.buyer_name.trim().is_empty() {
            errors.set(Field::BuyerName, "Buyer name is required");
        }
        self.contact.validate(&mut errors);

        let attendee_names = self.named_attendees();
        if attendee_names.is_empty() {
            errors.set(Field::Attendees, "At least one attendee is required");
        }

        let Some(payslip) = self.payslip.clone() else {
            errors.set(Field::Payslip, "Payslip upload is required");
            return Err(errors);
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(PurchaseRequest {
            quantity: u32::try_from(attendee_names.len()).unwrap_or(u32::MAX),
            buyer_name: self.names.buyer_name.clone(),
            phone: self.contact.phone.clone(),
            email: self.contact.email.clone(),
            reference_number: self.contact.reference_number.clone(),
            attendee_names,
            payslip,
        })
    }
}

/// One change to the buyer, attendee or contact fields of either form
#[derive(Clone, Debug, PartialEq)]
pub enum FormEdit {
    /// Type into the buyer name
    BuyerName(String),
    /// Type into one attendee name
    Attendee {
        /// Attendee position
        index: usize,
        /// New name
        name: String,
    },
    /// Append an empty attendee row
    AddAttendee,
    /// Drop one attendee row
    RemoveAttendee(usize),
    /// Type into the phone field
    Phone(String),
    /// Type into the email field
    Email(String),
    /// Type into the reference number field
    ReferenceNumber(String),
    /// Pick a proof-of-payment file
    Payslip(Upload),
}

impl FormEdit {
    fn apply(
        self,
        names: &mut AttendeeNames,
        contact: &mut Contact,
        payslip: &mut Option<Upload>,
    ) -> Result<(), FormError> {
        match self {
            Self::BuyerName(name) => names.set_buyer_name(name),
            Self::Attendee { index, name } => names.set_attendee(index, name)?,
            Self::AddAttendee => names.add_attendee(),
            Self::RemoveAttendee(index) => names.remove_attendee(index)?,
            Self::Phone(phone) => contact.phone = phone,
            Self::Email(email) => contact.email = email,
            Self::ReferenceNumber(reference) => contact.reference_number = reference,
            Self::Payslip(upload) => *payslip = Some(upload),
        }
        Ok(())
    }
}

impl TicketForm {
    /// Apply one field edit
    ///
    /// # Errors
    ///
    /// Returns the rejected attendee edit; the form is left unchanged.
    pub fn apply(&mut self, edit: FormEdit) -> Result<(), FormError> {
        edit.apply(&mut self.names, &mut self.contact, &mut self.payslip)
    }
}

impl PurchaseForm {
    /// Apply one field edit
    ///
    /// # Errors
    ///
    /// Returns the rejected attendee edit; the form is left unchanged.
    pub fn apply(&mut self, edit: FormEdit) -> Result<(), FormError> {
        edit.apply(&mut self.names, &mut self.contact, &mut self.payslip)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use elephant_testing::fixtures;

    fn filled_form() -> TicketForm {
        let mut form = TicketForm::new();
        form.names.set_buyer_name("Lance");
        form.contact = Contact {
            phone: "0917".to_string(),
            email: "lance@example.com".to_string(),
            reference_number: "REF-1".to_string(),
        };
        form.total_price = "500".to_string();
        form.payslip = Some(Upload::new("slip.jpg", "image/jpeg", vec![1]));
        form
    }

    #[test]
    fn test_buyer_and_first_attendee_stay_in_sync() {
        let mut names = AttendeeNames::default();
        names.set_buyer_name("Lance");
        assert_eq!(names.attendees()[0], "Lance");

        names.set_attendee(0, "Lance N.").unwrap();
        assert_eq!(names.buyer_name(), "Lance N.");
    }

    #[test]
    fn test_other_attendees_never_touch_buyer() {
        let mut names = AttendeeNames::new("Lance", vec![]);
        names.add_attendee();
        names.set_attendee(1, "Bea").unwrap();

        assert_eq!(names.buyer_name(), "Lance");
        assert_eq!(names.attendees(), ["Lance", "Bea"]);
    }

    #[test]
    fn test_remove_rules() {
        let mut names = AttendeeNames::new("Lance", vec![]);
        assert_eq!(names.remove_attendee(0), Err(FormError::CannotRemoveBuyer));
        assert_eq!(names.remove_attendee(1), Err(FormError::LastAttendee));

        names.add_attendee();
        names.add_attendee();
        assert_eq!(names.remove_attendee(0), Err(FormError::CannotRemoveBuyer));
        assert_eq!(names.remove_attendee(5), Err(FormError::NoSuchAttendee(5)));
        names.remove_attendee(2).unwrap();
        assert_eq!(names.attendees().len(), 2);
    }

    #[test]
    fn test_edit_form_prefills_from_ticket() {
        let ticket = fixtures::ticket(4, 1, "Lance", &["Bea"]);
        let form = TicketForm::edit(&ticket);

        assert_eq!(form.editing, Some(TicketId(4)));
        assert_eq!(form.names.attendees(), ["Lance", "Bea"]);
        assert_eq!(form.total_price, "1000");
    }

    #[test]
    fn test_unnamed_attendee_is_rejected_before_sending() {
        let form = TicketForm::new();
        let errors = form.validate(EventId(1)).unwrap_err();

        assert_eq!(errors.get(Field::BuyerName), Some("Buyer name is required"));
        assert_eq!(errors.get(Field::Attendees), Some("All attendee names are required"));
        assert_eq!(
            errors.get(Field::Payslip),
            Some("Payslip is required for new tickets")
        );
    }

    #[test]
    fn test_negative_or_garbage_price_is_rejected() {
        let mut form = filled_form();
        form.total_price = "-5".to_string();
        assert!(form.validate(EventId(1)).unwrap_err().get(Field::TotalPrice).is_some());

        form.total_price = "five".to_string();
        assert!(form.validate(EventId(1)).unwrap_err().get(Field::TotalPrice).is_some());
    }

    #[test]
    fn test_valid_create_carries_event_id() {
        let submission = filled_form().validate(EventId(9)).unwrap();
        assert_eq!(submission.event_id, Some(EventId(9)));
        assert_eq!(submission.attendee_names, ["Lance"]);
    }

    #[test]
    fn test_edit_needs_no_new_payslip() {
        let ticket = fixtures::ticket(4, 1, "Lance", &[]);
        let submission = TicketForm::edit(&ticket).validate(EventId(1)).unwrap();
        assert_eq!(submission.event_id, None);
        assert!(submission.payslip.is_none());
    }

    #[test]
    fn test_purchase_quantity_counts_named_attendees() {
        let mut form = PurchaseForm::default();
        form.names.set_buyer_name("Lance");
        form.names.add_attendee();
        form.names.add_attendee();
        form.names.set_attendee(2, "Bea").unwrap();
        form.contact = Contact {
            phone: "0917".to_string(),
            email: "lance@example.com".to_string(),
            reference_number: "REF-1".to_string(),
        };
        form.payslip = Some(Upload::new("slip.jpg", "image/jpeg", vec![1]));

        let request = form.validate().unwrap();
        assert_eq!(request.quantity, 2);
        assert_eq!(request.attendee_names, ["Lance", "Bea"]);
    }

    #[test]
    fn test_purchase_requires_payslip() {
        let form = PurchaseForm::default();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get(Field::Payslip), Some("Payslip upload is required"));
    }
}
