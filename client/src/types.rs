//! Wire types for the ticketing backend
//!
//! These mirror the backend's JSON resources. The client never owns or
//! persists them; pages hold them in transient state for one view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw numeric id
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

numeric_id!(
    /// Backend identifier of an event
    EventId
);
numeric_id!(
    /// Backend identifier of a ticket purchase
    TicketId
);
numeric_id!(
    /// Backend identifier of an attendee
    AttendeeId
);

// ============================================================================
// Events
// ============================================================================

/// A party night as returned by the public and admin event endpoints
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event id (read-only)
    pub id: EventId,
    /// Title shown on cards and report filenames
    pub title: String,
    /// Free-form date text ("Saturday, June 7")
    #[serde(default)]
    pub display_date: String,
    /// Venue name
    #[serde(default)]
    pub venue_name: String,
    /// Venue street address
    #[serde(default)]
    pub venue_address: String,
    /// Free-form time text ("10PM onwards")
    #[serde(default)]
    pub event_time: String,
    /// Event description
    #[serde(default)]
    pub description: String,
    /// Body of the confirmation email sent to buyers
    #[serde(default)]
    pub email_template_content: String,
    /// Price of a single ticket
    #[serde(default, deserialize_with = "de::decimal")]
    pub ticket_price_regular: f64,
    /// Price per ticket when buying a bundle
    #[serde(default, deserialize_with = "de::optional_decimal")]
    pub ticket_price_bundle: Option<f64>,
    /// Number of tickets in a bundle
    #[serde(default)]
    pub bundle_size: Option<u32>,
    /// Ticket inventory
    #[serde(default)]
    pub max_tickets: u32,
    /// Tickets sold so far (read-only, maintained by the backend)
    #[serde(default)]
    pub sold_tickets: u32,
    /// Last day tickets can be bought online
    #[serde(default)]
    pub ticket_deadline: String,
    /// Whether the event is open for sales
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Message shown while the event is inactive
    #[serde(default)]
    pub inactive_message: Option<String>,
    /// Calendar date the party starts
    #[serde(with = "de::calendar_date")]
    pub start_date: NaiveDate,
    /// Door price for walk-ins
    #[serde(default, deserialize_with = "de::decimal")]
    pub walk_in_price: f64,
    /// Walk-ins paid in cash (read-only)
    #[serde(default)]
    pub walk_in_cash_count: u32,
    /// Walk-ins paid by GCash (read-only)
    #[serde(default)]
    pub walk_in_gcash_count: u32,
    /// Poster image path or URL
    #[serde(default)]
    pub poster_image_url: Option<String>,
}

const fn default_active() -> bool {
    true
}

impl Event {
    /// Tickets still available for online sale
    #[must_use]
    pub const fn tickets_left(&self) -> u32 {
        self.max_tickets.saturating_sub(self.sold_tickets)
    }

    /// Current walk-in counters
    #[must_use]
    pub const fn walk_ins(&self) -> WalkInCount {
        WalkInCount {
            cash: self.walk_in_cash_count,
            gcash: self.walk_in_gcash_count,
        }
    }

    /// Merge one counter returned by a walk-in adjustment
    pub const fn apply_walk_in(&mut self, payment_type: PaymentType, counts: WalkInCount) {
        match payment_type {
            PaymentType::Cash => self.walk_in_cash_count = counts.cash,
            PaymentType::Gcash => self.walk_in_gcash_count = counts.gcash,
        }
    }
}

/// The editable part of an event
///
/// Read-only fields (`id`, `sold_tickets`, walk-in counts) are not part of
/// this type, so an update payload can never carry them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Title
    pub title: String,
    /// Free-form date text
    pub display_date: String,
    /// Venue name
    pub venue_name: String,
    /// Venue address
    pub venue_address: String,
    /// Free-form time text
    pub event_time: String,
    /// Description
    pub description: String,
    /// Confirmation email body
    pub email_template_content: String,
    /// Single ticket price
    pub ticket_price_regular: f64,
    /// Bundle price (cleared with `None`)
    pub ticket_price_bundle: Option<f64>,
    /// Bundle size (cleared with `None`)
    pub bundle_size: Option<u32>,
    /// Ticket inventory
    pub max_tickets: u32,
    /// Online sales deadline
    pub ticket_deadline: String,
    /// Open for sales
    pub is_active: bool,
    /// Message while inactive
    pub inactive_message: Option<String>,
    /// Start date
    #[serde(with = "de::calendar_date")]
    pub start_date: NaiveDate,
    /// Door price
    pub walk_in_price: f64,
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            display_date: event.display_date.clone(),
            venue_name: event.venue_name.clone(),
            venue_address: event.venue_address.clone(),
            event_time: event.event_time.clone(),
            description: event.description.clone(),
            email_template_content: event.email_template_content.clone(),
            ticket_price_regular: event.ticket_price_regular,
            ticket_price_bundle: event.ticket_price_bundle,
            bundle_size: event.bundle_size,
            max_tickets: event.max_tickets,
            ticket_deadline: event.ticket_deadline.clone(),
            is_active: event.is_active,
            inactive_message: event.inactive_message.clone(),
            start_date: event.start_date,
            walk_in_price: event.walk_in_price,
        }
    }
}

// ============================================================================
// Tickets and attendees
// ============================================================================

/// One person admitted on a ticket purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Attendee id
    #[serde(default)]
    pub id: AttendeeId,
    /// Display name
    pub name: String,
    /// Whether the attendee is through the door
    #[serde(default)]
    pub checked_in: bool,
    /// Key shared by every attendee of one purchase
    #[serde(default)]
    pub group_identifier: String,
    /// Whether the backend marks this attendee as the buyer
    #[serde(default)]
    pub is_primary: bool,
    /// Owning purchase, when the endpoint includes it
    #[serde(default)]
    pub ticket_purchase_id: Option<TicketId>,
}

/// A ticket purchase with its attendees
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketPurchase {
    /// Purchase id
    pub id: TicketId,
    /// Event the tickets are for
    pub event_id: EventId,
    /// Buyer name
    pub buyer_name: String,
    /// Buyer phone
    #[serde(default)]
    pub phone: String,
    /// Buyer email
    #[serde(default)]
    pub email: String,
    /// Proof-of-payment image
    #[serde(default)]
    pub payslip_url: String,
    /// Payment reference number
    #[serde(default)]
    pub reference_number: String,
    /// Amount paid
    #[serde(default, deserialize_with = "de::decimal")]
    pub total_price: f64,
    /// When the purchase was recorded
    pub created_at: DateTime<Utc>,
    /// Attendees in purchase order
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

// ============================================================================
// Walk-ins
// ============================================================================

/// How a walk-in paid at the door
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Cash
    Cash,
    /// GCash mobile wallet
    Gcash,
}

impl PaymentType {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Gcash => "gcash",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "gcash" => Ok(Self::Gcash),
            other => Err(format!("unknown payment type '{other}' (expected cash or gcash)")),
        }
    }
}

/// Walk-in counters of an event
///
/// The backend answers adjustments with either `{cash, gcash}` or the
/// event-shaped `walk_in_cash_count` / `walk_in_gcash_count` fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkInCount {
    /// Cash walk-ins
    #[serde(default, alias = "walk_in_cash_count")]
    pub cash: u32,
    /// GCash walk-ins
    #[serde(default, alias = "walk_in_gcash_count")]
    pub gcash: u32,
}

impl WalkInCount {
    /// Counter for one payment type
    #[must_use]
    pub const fn get(self, payment_type: PaymentType) -> u32 {
        match payment_type {
            PaymentType::Cash => self.cash,
            PaymentType::Gcash => self.gcash,
        }
    }

    /// Both counters together, widened so the sum cannot overflow
    #[must_use]
    pub fn total(self) -> u64 {
        u64::from(self.cash) + u64::from(self.gcash)
    }
}

/// Direction of a walk-in counter change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkInAdjustment {
    /// One more walk-in
    Increment,
    /// One fewer walk-in
    Decrement,
}

impl WalkInAdjustment {
    /// Path segment of the adjustment endpoint
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
        }
    }
}

// ============================================================================
// Reports and pages
// ============================================================================

/// PDF reports generated by the backend for one event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Door list of all attendees
    AttendeeList,
    /// Financial report
    Accounting,
    /// Buyer email addresses
    EmailList,
}

impl ReportKind {
    /// All report kinds in display order
    pub const ALL: [Self; 3] = [Self::AttendeeList, Self::Accounting, Self::EmailList];

    /// Path segment under `/admin/events/:id/`
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::AttendeeList => "attendee-list",
            Self::Accounting => "accounting",
            Self::EmailList => "email-list",
        }
    }
}

/// CMS-managed text of a public page (about, contact, ...)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    /// Optional heading
    #[serde(default)]
    pub title: Option<String>,
    /// Body text; paragraphs separated by newlines
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of `POST /auth/login` responses
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub success: bool,
}

// ============================================================================
// Lenient deserializers
// ============================================================================

/// The backend serializes decimals as strings and dates either as plain
/// dates or full timestamps.
mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    fn parse<E: serde::de::Error>(value: NumberOrString) -> Result<f64, E> {
        match value {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid decimal '{s}'"))),
        }
    }

    pub fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<NumberOrString>::deserialize(deserializer)?.map_or(Ok(0.0), parse)
    }

    pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrString::Text(s)) if s.trim().is_empty() || s == "null" => Ok(None),
            Some(value) => parse(value).map(Some),
        }
    }

    pub mod calendar_date {
        use chrono::{DateTime, NaiveDate, NaiveDateTime};
        use serde::{Deserialize, Deserializer, Serializer};

        const FORMAT: &str = "%Y-%m-%d";

        pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(&date.format(FORMAT))
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
        }

        pub(crate) fn parse(raw: &str) -> Option<NaiveDate> {
            let raw = raw.trim();
            NaiveDate::parse_from_str(raw, FORMAT)
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
                .or_else(|| {
                    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|dt| dt.date())
                })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use serde_json::json;

    fn event_json() -> serde_json::Value {
        json!({
            "id": 5,
            "title": "Elephant: Pride Edition",
            "display_date": "Saturday, June 28",
            "venue_name": "XX XX",
            "venue_address": "Makati",
            "event_time": "10PM",
            "description": "Dance",
            "email_template_content": "See you!",
            "ticket_price_regular": "500.00",
            "ticket_price_bundle": 450,
            "bundle_size": 4,
            "max_tickets": 300,
            "sold_tickets": 120,
            "ticket_deadline": "2025-06-27",
            "is_active": true,
            "inactive_message": null,
            "start_date": "2025-06-28T00:00:00.000Z",
            "walk_in_price": 600,
            "walk_in_cash_count": 3,
            "walk_in_gcash_count": 2,
            "poster_image_url": "/posters/pride.jpg"
        })
    }

    #[test]
    fn test_event_accepts_decimal_strings_and_timestamps() {
        let event: Event = serde_json::from_value(event_json()).unwrap();
        assert_eq!(event.id, EventId(5));
        assert!((event.ticket_price_regular - 500.0).abs() < f64::EPSILON);
        assert_eq!(event.ticket_price_bundle, Some(450.0));
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2025, 6, 28).unwrap());
        assert_eq!(event.tickets_left(), 180);
        assert_eq!(event.walk_ins().total(), 5);
    }

    #[test]
    fn test_public_event_defaults_missing_admin_fields() {
        let event: Event = serde_json::from_value(json!({
            "id": 1,
            "title": "Elephant",
            "start_date": "2025-07-01",
            "ticket_price_bundle": ""
        }))
        .unwrap();

        assert!(event.is_active);
        assert_eq!(event.max_tickets, 0);
        assert_eq!(event.ticket_price_bundle, None);
        assert!(event.poster_image_url.is_none());
    }

    #[test]
    fn test_draft_serialization_has_no_read_only_fields() {
        let event: Event = serde_json::from_value(event_json()).unwrap();
        let draft = EventDraft::from(&event);
        let value = serde_json::to_value(&draft).unwrap();

        for read_only in ["id", "sold_tickets", "walk_in_cash_count", "walk_in_gcash_count"] {
            assert!(value.get(read_only).is_none(), "{read_only} leaked into draft");
        }
        assert_eq!(value["start_date"], "2025-06-28");
    }

    #[test]
    fn test_walk_in_count_accepts_event_shape() {
        let counts: WalkInCount = serde_json::from_value(json!({
            "id": 5,
            "walk_in_cash_count": 4,
            "walk_in_gcash_count": 1
        }))
        .unwrap();
        assert_eq!(counts, WalkInCount { cash: 4, gcash: 1 });

        let counts: WalkInCount = serde_json::from_value(json!({ "cash": 2 })).unwrap();
        assert_eq!(counts, WalkInCount { cash: 2, gcash: 0 });
    }

    #[test]
    fn test_apply_walk_in_touches_one_counter() {
        let mut event: Event = serde_json::from_value(event_json()).unwrap();
        event.apply_walk_in(PaymentType::Gcash, WalkInCount { cash: 99, gcash: 7 });

        assert_eq!(event.walk_in_cash_count, 3);
        assert_eq!(event.walk_in_gcash_count, 7);
    }

    #[test]
    fn test_walk_in_total_of_huge_counters() {
        let counts = WalkInCount {
            cash: u32::MAX,
            gcash: 1,
        };
        assert_eq!(counts.total(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_payment_type_round_trips_through_text() {
        assert_eq!("GCash".parse::<PaymentType>().unwrap(), PaymentType::Gcash);
        assert_eq!(serde_json::to_string(&PaymentType::Cash).unwrap(), r#""cash""#);
        assert!("card".parse::<PaymentType>().is_err());
    }

    #[test]
    fn test_ticket_defaults_attendee_fields() {
        let ticket: TicketPurchase = serde_json::from_value(json!({
            "id": 10,
            "event_id": 5,
            "buyer_name": "Lance",
            "reference_number": "REF-1",
            "total_price": "1000.50",
            "created_at": "2025-06-01T12:00:00.000Z",
            "attendees": [{ "name": "Lance", "checked_in": false }]
        }))
        .unwrap();

        assert_eq!(ticket.attendees.len(), 1);
        assert_eq!(ticket.attendees[0].id, AttendeeId(0));
        assert!((ticket.total_price - 1000.5).abs() < f64::EPSILON);
    }
}
