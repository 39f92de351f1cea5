//! Test data builders for backend resources
//!
//! Fixtures start from realistic defaults; tests override the fields they
//! care about with struct update syntax or direct assignment.

#![allow(clippy::expect_used)] // Fixtures are only used from tests

use chrono::{DateTime, NaiveDate, Utc};
use elephant_client::{Attendee, AttendeeId, Event, EventId, TicketId, TicketPurchase};

/// Parse a `YYYY-MM-DD` date
///
/// # Panics
///
/// Panics on malformed input.
#[must_use]
pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("fixture dates are YYYY-MM-DD")
}

/// Parse an RFC 3339 timestamp
///
/// # Panics
///
/// Panics on malformed input.
#[must_use]
pub fn timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("fixture timestamps are RFC 3339")
        .with_timezone(&Utc)
}

/// An active event with 100 tickets, none sold
///
/// # Panics
///
/// Panics if `start_date` is not `YYYY-MM-DD`.
#[must_use]
pub fn event(id: u64, title: &str, start_date: &str) -> Event {
    Event {
        id: EventId(id),
        title: title.to_string(),
        display_date: "Saturday".to_string(),
        venue_name: "The Warehouse".to_string(),
        venue_address: "Poblacion, Makati".to_string(),
        event_time: "10PM onwards".to_string(),
        description: "An Elephant night".to_string(),
        email_template_content: "See you on the dance floor!".to_string(),
        ticket_price_regular: 500.0,
        ticket_price_bundle: Some(450.0),
        bundle_size: Some(4),
        max_tickets: 100,
        sold_tickets: 0,
        ticket_deadline: start_date.to_string(),
        is_active: true,
        inactive_message: None,
        start_date: date(start_date),
        walk_in_price: 600.0,
        walk_in_cash_count: 0,
        walk_in_gcash_count: 0,
        poster_image_url: None,
    }
}

/// An attendee that is not yet checked in
#[must_use]
pub fn attendee(id: u64, name: &str, group: &str) -> Attendee {
    Attendee {
        id: AttendeeId(id),
        name: name.to_string(),
        checked_in: false,
        group_identifier: group.to_string(),
        is_primary: name == group,
        ticket_purchase_id: None,
    }
}

/// A ticket purchase whose first attendee is the buyer
///
/// Attendee ids are derived from the ticket id (`id * 100 + index`).
#[must_use]
pub fn ticket(id: u64, event_id: u64, buyer: &str, guests: &[&str]) -> TicketPurchase {
    let attendees = std::iter::once(buyer)
        .chain(guests.iter().copied())
        .zip(0u64..)
        .map(|(name, index)| Attendee {
            ticket_purchase_id: Some(TicketId(id)),
            ..attendee(id * 100 + index, name, buyer)
        })
        .collect::<Vec<_>>();

    let slug = buyer.to_lowercase().replace(' ', ".");
    #[allow(clippy::cast_precision_loss)] // Small fixture counts
    let total_price = 500.0 * attendees.len() as f64;
    TicketPurchase {
        id: TicketId(id),
        event_id: EventId(event_id),
        buyer_name: buyer.to_string(),
        phone: "09171234567".to_string(),
        email: format!("{slug}@example.com"),
        payslip_url: format!("/uploads/payslip-{id}.jpg"),
        reference_number: format!("REF-{id:04}"),
        total_price,
        created_at: timestamp("2025-06-01T12:00:00Z"),
        attendees,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_fixture_groups_under_buyer() {
        let ticket = ticket(3, 1, "Lance Reyes", &["Bea", "Carlo"]);
        assert_eq!(ticket.attendees.len(), 3);
        assert!(ticket.attendees[0].is_primary);
        assert!(ticket.attendees.iter().all(|a| a.group_identifier == "Lance Reyes"));
        assert_eq!(ticket.email, "lance.reyes@example.com");
        assert_eq!(ticket.attendees[2].id, AttendeeId(302));
    }
}
