//! Ticket list search and sorting

use elephant_client::TicketPurchase;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Column the ticket list is sorted by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Purchase time
    #[default]
    CreatedAt,
    /// Buyer name
    BuyerName,
    /// Attendee names joined
    Attendees,
    /// Amount paid
    TotalPrice,
    /// Payment reference
    ReferenceNumber,
    /// Email then phone
    Contact,
}

impl SortKey {
    /// Every key, in column order
    pub const ALL: [Self; 6] = [
        Self::CreatedAt,
        Self::BuyerName,
        Self::Attendees,
        Self::TotalPrice,
        Self::ReferenceNumber,
        Self::Contact,
    ];

    /// Name used on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::BuyerName => "buyer_name",
            Self::Attendees => "attendees",
            Self::TotalPrice => "total_price",
            Self::ReferenceNumber => "reference_number",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| format!("unknown sort key '{s}'"))
    }
}

/// Sort direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// Current sort of the ticket list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TicketSort {
    /// Column
    pub key: SortKey,
    /// Direction
    pub direction: Direction,
}

impl Default for TicketSort {
    /// Newest purchases first
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction: Direction::Descending,
        }
    }
}

impl TicketSort {
    /// Sort chosen by clicking a column header
    ///
    /// Clicking the active key while ascending flips to descending; every
    /// other click sorts ascending by the clicked key.
    #[must_use]
    pub fn toggled(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == Direction::Ascending {
            Direction::Descending
        } else {
            Direction::Ascending
        };
        Self { key, direction }
    }
}

fn attendee_names(ticket: &TicketPurchase) -> String {
    ticket
        .attendees
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn contact(ticket: &TicketPurchase) -> String {
    format!("{} {}", ticket.email, ticket.phone)
}

fn compare(key: SortKey, a: &TicketPurchase, b: &TicketPurchase) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::BuyerName => a.buyer_name.to_lowercase().cmp(&b.buyer_name.to_lowercase()),
        SortKey::Attendees => attendee_names(a)
            .to_lowercase()
            .cmp(&attendee_names(b).to_lowercase()),
        SortKey::TotalPrice => a.total_price.total_cmp(&b.total_price),
        SortKey::ReferenceNumber => a.reference_number.cmp(&b.reference_number),
        SortKey::Contact => contact(a).to_lowercase().cmp(&contact(b).to_lowercase()),
    }
}

/// Whether a ticket matches a search query
///
/// Matches buyer name, email, reference number or any attendee name,
/// case-insensitively. A blank query matches everything.
#[must_use]
pub fn matches(ticket: &TicketPurchase, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let hit = |text: &str| text.to_lowercase().contains(&needle);
    hit(&ticket.buyer_name)
        || hit(&ticket.email)
        || hit(&ticket.reference_number)
        || ticket.attendees.iter().any(|a| hit(&a.name))
}

/// Search, then sort
#[must_use]
pub fn visible_tickets<'a>(
    tickets: &'a [TicketPurchase],
    query: &str,
    sort: TicketSort,
) -> Vec<&'a TicketPurchase> {
    let mut visible: Vec<&TicketPurchase> = tickets.iter().filter(|t| matches(t, query)).collect();
    visible.sort_by(|a, b| {
        let ordering = compare(sort.key, a, b);
        match sort.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use elephant_testing::fixtures;

    fn ids(tickets: &[&TicketPurchase]) -> Vec<u64> {
        tickets.iter().map(|t| t.id.get()).collect()
    }

    fn sample() -> Vec<TicketPurchase> {
        let mut first = fixtures::ticket(1, 1, "Mika", &["Jo"]);
        first.created_at = fixtures::timestamp("2025-06-01T10:00:00Z");
        let mut second = fixtures::ticket(2, 1, "Andi", &[]);
        second.created_at = fixtures::timestamp("2025-06-03T10:00:00Z");
        let mut third = fixtures::ticket(3, 1, "Lance", &["Bea", "Carlo"]);
        third.created_at = fixtures::timestamp("2025-06-02T10:00:00Z");
        vec![first, second, third]
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let tickets = sample();
        let visible = visible_tickets(&tickets, "", TicketSort::default());
        assert_eq!(ids(&visible), [2, 3, 1]);
    }

    #[test]
    fn test_toggle_flips_only_active_ascending_key() {
        let sort = TicketSort::default().toggled(SortKey::CreatedAt);
        assert_eq!(sort.direction, Direction::Ascending);

        let sort = sort.toggled(SortKey::CreatedAt);
        assert_eq!(sort.direction, Direction::Descending);

        let sort = sort.toggled(SortKey::BuyerName);
        assert_eq!(sort, TicketSort { key: SortKey::BuyerName, direction: Direction::Ascending });
    }

    #[test]
    fn test_sort_by_price_and_buyer() {
        let tickets = sample();
        let by_price = TicketSort { key: SortKey::TotalPrice, direction: Direction::Descending };
        assert_eq!(ids(&visible_tickets(&tickets, "", by_price)), [3, 1, 2]);

        let by_buyer = TicketSort::default().toggled(SortKey::BuyerName);
        assert_eq!(ids(&visible_tickets(&tickets, "", by_buyer)), [2, 3, 1]);
    }

    #[test]
    fn test_search_covers_attendees_and_reference() {
        let tickets = sample();
        assert_eq!(ids(&visible_tickets(&tickets, "carlo", TicketSort::default())), [3]);
        assert_eq!(ids(&visible_tickets(&tickets, "ref-0002", TicketSort::default())), [2]);
        assert_eq!(ids(&visible_tickets(&tickets, "MIKA@", TicketSort::default())), [1]);
    }

    #[test]
    fn test_sort_key_parses_cli_names() {
        assert_eq!("total_price".parse::<SortKey>(), Ok(SortKey::TotalPrice));
        assert!("price".parse::<SortKey>().is_err());
    }
}
