//! Plain-text views of page state for the console

use crate::features::dashboard::DashboardState;
use crate::features::door::DoorState;
use crate::features::downloads::DownloadsState;
use crate::features::event_editor::EventEditorState;
use crate::features::pages::ContentState;
use crate::features::public_events::ListingState;
use crate::features::purchase::PurchaseState;
use crate::features::ticket_desk::TicketDeskState;
use crate::page::{Loadable, PageError};
use crate::reports;
use elephant_client::{Event, PaymentType, ReportKind, TicketPurchase};
use std::fmt::Write;

fn peso(amount: f64) -> String {
    format!("₱{amount:.2}")
}

/// Loading / error line for a page that has nothing to show yet
fn pending<T>(loadable: &Loadable<T>) -> Option<String> {
    match loadable {
        Loadable::Idle | Loadable::Loading => Some("Loading...\n".to_string()),
        Loadable::Failed(error) => Some(format!("{error}\n")),
        Loadable::Loaded(_) => None,
    }
}

fn error_line(out: &mut String, error: Option<&PageError>) {
    if let Some(error) = error {
        let _ = writeln!(out, "! {error}");
    }
}

/// One event as a card
#[must_use]
pub fn event_card(event: &Event) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", event.id, event.title);
    let _ = writeln!(out, "  {} · {}", event.display_date, event.event_time);
    let _ = writeln!(out, "  {}, {}", event.venue_name, event.venue_address);
    let _ = write!(out, "  {} per ticket", peso(event.ticket_price_regular));
    if let (Some(price), Some(size)) = (event.ticket_price_bundle, event.bundle_size) {
        let _ = write!(out, ", {} each in groups of {size}", peso(price));
    }
    let _ = writeln!(out, " · door {}", peso(event.walk_in_price));
    if event.is_active {
        let _ = writeln!(out, "  {} tickets left · sales close {}", event.tickets_left(), event.ticket_deadline);
    } else {
        let message = event.inactive_message.as_deref().unwrap_or("Not on sale");
        let _ = writeln!(out, "  {message}");
    }
    out
}

/// Public listing page
#[must_use]
pub fn listing(state: &ListingState) -> String {
    if let Some(line) = pending(&state.events) {
        return line;
    }
    let Some(page) = state.current() else {
        return "No events yet.\n".to_string();
    };

    let mut out = String::new();
    if let Some(featured) = &page.featured {
        let _ = writeln!(out, "FEATURED");
        out.push_str(&event_card(featured));
        out.push('\n');
    }
    for event in &page.events {
        out.push_str(&event_card(event));
    }
    if page.featured.is_none() && page.events.is_empty() {
        let _ = writeln!(out, "No events yet.");
    }
    let _ = writeln!(out, "\nPage {} of {}", page.page, page.total_pages);
    out
}

/// About / contact page
#[must_use]
pub fn content(state: &ContentState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", state.title.as_deref().unwrap_or(state.page.heading()));
    for paragraph in &state.paragraphs {
        let _ = writeln!(out, "\n{paragraph}");
    }
    out
}

/// Public event page with the outcome of a purchase
#[must_use]
pub fn purchase(state: &PurchaseState) -> String {
    if let Some(line) = pending(&state.event) {
        return line;
    }
    let mut out = state.event.value().map(event_card).unwrap_or_default();
    if let Some(purchase) = &state.purchase {
        let _ = writeln!(
            out,
            "\nThank you, {}! {} ticket(s) reserved (ticket #{}). A confirmation will be sent to {}.",
            purchase.buyer_name,
            purchase.attendees.len(),
            purchase.id,
            purchase.email
        );
    }
    if !state.form_errors.is_empty() {
        let _ = writeln!(out, "! {}", state.form_errors);
    }
    out
}

/// Admin dashboard
#[must_use]
pub fn dashboard(state: &DashboardState) -> String {
    if let Some(line) = pending(&state.events) {
        return line;
    }
    let row = |out: &mut String, event: &Event| {
        let _ = writeln!(
            out,
            "  #{:<4} {:<40} {}  {}/{} sold",
            event.id.get(),
            event.title,
            event.start_date,
            event.sold_tickets,
            event.max_tickets
        );
    };

    let mut out = String::from("Event Management Dashboard\n\nActive events\n");
    let active = state.active();
    if active.is_empty() {
        out.push_str("  none\n");
    }
    for event in active {
        row(&mut out, event);
    }

    let inactive = state.inactive();
    let _ = writeln!(out, "\nInactive events ({})", inactive.len());
    if state.show_inactive {
        for event in inactive {
            row(&mut out, event);
        }
    }
    out
}

/// Admin event detail
#[must_use]
pub fn event_detail(state: &EventEditorState) -> String {
    if let Some(line) = pending(&state.event) {
        return line;
    }
    let mut out = String::new();
    if let Some(event) = state.event.value() {
        out.push_str(&event_card(event));
        let _ = writeln!(
            out,
            "  status: {} · sold {}/{} · walk-ins {} cash, {} gcash",
            if event.is_active { "active" } else { "inactive" },
            event.sold_tickets,
            event.max_tickets,
            event.walk_in_cash_count,
            event.walk_in_gcash_count
        );
    }
    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "{notice}");
    }
    error_line(&mut out, state.error.as_ref());
    out
}

fn ticket_row(out: &mut String, ticket: &TicketPurchase) {
    let names: Vec<&str> = ticket.attendees.iter().map(|a| a.name.as_str()).collect();
    let _ = writeln!(
        out,
        "  #{:<5} {:<24} {:<10} {:<16} {:<28} {}",
        ticket.id.get(),
        ticket.buyer_name,
        peso(ticket.total_price),
        ticket.reference_number,
        ticket.email,
        names.join(", ")
    );
}

/// Ticket desk
#[must_use]
pub fn ticket_desk(state: &TicketDeskState) -> String {
    if let Some(line) = pending(&state.event) {
        return line;
    }
    let mut out = String::new();
    if let Some(event) = state.event.value() {
        let _ = writeln!(out, "Tickets for {}", event.title);
    }
    let visible = state.visible();
    let _ = writeln!(out, "{} of {} purchases (sorted by {})", visible.len(), state.tickets.len(), state.sort.key);
    for ticket in visible {
        ticket_row(&mut out, ticket);
    }
    if !state.form_errors.is_empty() {
        let _ = writeln!(out, "! {}", state.form_errors);
    }
    error_line(&mut out, state.error.as_ref());
    out
}

/// Door check-in list
#[must_use]
pub fn door(state: &DoorState) -> String {
    if let Some(line) = pending(&state.list) {
        return line;
    }
    let mut out = String::new();
    if let Some(list) = state.list.value() {
        let _ = writeln!(out, "Door: {}", list.event.title);
    }
    for group in state.groups() {
        let _ = writeln!(out, "{} ({}/{})", group.identifier, group.checked_in(), group.members.len());
        for member in &group.members {
            let mark = if member.checked_in { "x" } else { " " };
            let _ = writeln!(out, "  [{mark}] #{} {}", member.id, member.name);
        }
    }
    if let Some(summary) = state.summary() {
        let _ = writeln!(
            out,
            "\nChecked in {}/{} · walk-ins {} · total guests {}",
            summary.checked_in,
            summary.total_attendees,
            summary.walk_ins.total(),
            summary.total_guests
        );
        for payment_type in [PaymentType::Cash, PaymentType::Gcash] {
            let _ = writeln!(
                out,
                "  {payment_type}: {} walk-ins, {}",
                summary.walk_ins.get(payment_type),
                peso(summary.revenue(payment_type))
            );
        }
    }
    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "{notice}");
    }
    error_line(&mut out, state.error.as_ref());
    out
}

/// Report downloads
#[must_use]
pub fn downloads(state: &DownloadsState) -> String {
    if let Some(line) = pending(&state.event) {
        return line;
    }
    let mut out = String::new();
    if let Some(event) = state.event.value() {
        let _ = writeln!(out, "Reports for {}", event.title);
    }
    for kind in ReportKind::ALL {
        let _ = writeln!(out, "  {}", reports::label(kind));
    }
    for path in &state.saved {
        let _ = writeln!(out, "Saved {}", path.display());
    }
    error_line(&mut out, state.error.as_ref());
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::features::dashboard::{DashboardAction, DashboardReducer};
    use crate::features::test_support::env;
    use elephant_testing::{fixtures, MockBackend, ReducerTest};

    #[test]
    fn test_inactive_card_shows_message() {
        let mut event = fixtures::event(1, "Elephant", "2025-06-28");
        event.is_active = false;
        event.inactive_message = Some("Sold out!".to_string());

        let card = event_card(&event);
        assert!(card.starts_with("#1 Elephant"));
        assert!(card.contains("Sold out!"));
        assert!(!card.contains("tickets left"));
    }

    #[test]
    fn test_dashboard_folds_inactive_events() {
        let mut closed = fixtures::event(2, "Closed night", "2025-01-01");
        closed.is_active = false;

        ReducerTest::new(DashboardReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(DashboardState::default())
            .when_action(DashboardAction::Loaded {
                result: Ok(vec![fixtures::event(1, "Open night", "2025-07-01"), closed]),
            })
            .then_state(|state| {
                let text = dashboard(state);
                assert!(text.contains("Open night"));
                assert!(text.contains("Inactive events (1)"));
                assert!(!text.contains("Closed night"));
            })
            .run();
    }

    #[test]
    fn test_failed_page_shows_error_only() {
        let state = DashboardState {
            events: Loadable::Failed(PageError::AuthRequired),
            ..DashboardState::default()
        };
        assert_eq!(dashboard(&state), "Authentication required. Redirecting to login...\n");
    }
}
