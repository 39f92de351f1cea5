//! Door list: search, grouping by purchase, and the evening's totals

use elephant_client::{Attendee, Event, PaymentType, WalkInCount};

/// Attendees whose name or group identifier contains `query` (case-insensitive)
///
/// An empty or blank query keeps everyone.
#[must_use]
pub fn filter_attendees<'a>(attendees: &'a [Attendee], query: &str) -> Vec<&'a Attendee> {
    let needle = query.trim().to_lowercase();
    attendees
        .iter()
        .filter(|a| {
            needle.is_empty()
                || a.name.to_lowercase().contains(&needle)
                || a.group_identifier.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Attendees sharing one group identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttendeeGroup<'a> {
    /// Shared group identifier (usually the buyer's name)
    pub identifier: &'a str,
    /// Members, primary attendee first
    pub members: Vec<&'a Attendee>,
}

impl AttendeeGroup<'_> {
    /// Members already through the door
    #[must_use]
    pub fn checked_in(&self) -> usize {
        self.members.iter().filter(|a| a.checked_in).count()
    }
}

/// Cluster attendees by group identifier
///
/// Groups appear in the order their first member appears. Within a group
/// the attendee whose name equals the identifier comes first; everyone else
/// keeps their original order.
#[must_use]
pub fn group_attendees<'a, I>(attendees: I) -> Vec<AttendeeGroup<'a>>
where
    I: IntoIterator<Item = &'a Attendee>,
{
    let mut groups: Vec<AttendeeGroup<'a>> = Vec::new();

    for attendee in attendees {
        let identifier = attendee.group_identifier.as_str();
        match groups.iter_mut().find(|g| g.identifier == identifier) {
            Some(group) => group.members.push(attendee),
            None => groups.push(AttendeeGroup {
                identifier,
                members: vec![attendee],
            }),
        }
    }

    for group in &mut groups {
        let identifier = group.identifier;
        group.members.sort_by_key(|a| a.name != identifier);
    }

    groups
}

/// Headcount and door revenue for one event
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DoorSummary {
    /// Attendees with tickets
    pub total_attendees: usize,
    /// Ticket holders checked in
    pub checked_in: usize,
    /// Walk-in counters
    pub walk_ins: WalkInCount,
    /// Checked-in ticket holders plus all walk-ins
    pub total_guests: usize,
    /// Door revenue collected in cash
    pub cash_revenue: f64,
    /// Door revenue collected over GCash
    pub gcash_revenue: f64,
}

impl DoorSummary {
    /// Door revenue for one payment type
    #[must_use]
    pub const fn revenue(&self, payment_type: PaymentType) -> f64 {
        match payment_type {
            PaymentType::Cash => self.cash_revenue,
            PaymentType::Gcash => self.gcash_revenue,
        }
    }
}

/// Tally the door for `event`
#[must_use]
pub fn summarize(event: &Event, attendees: &[Attendee]) -> DoorSummary {
    let walk_ins = event.walk_ins();
    let checked_in = attendees.iter().filter(|a| a.checked_in).count();

    DoorSummary {
        total_attendees: attendees.len(),
        checked_in,
        walk_ins,
        total_guests: checked_in
            .saturating_add(usize::try_from(walk_ins.total()).unwrap_or(usize::MAX)),
        cash_revenue: f64::from(walk_ins.cash) * event.walk_in_price,
        gcash_revenue: f64::from(walk_ins.gcash) * event.walk_in_price,
    }
}
