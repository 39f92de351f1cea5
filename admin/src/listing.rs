//! Public event listing: ordering and client-side pagination
//!
//! The backend returns every event in one response. The listing shows
//! upcoming events first (soonest first), then past events (most recent
//! first), split into fixed-size pages. The soonest upcoming event gets the
//! featured slot on page 1 and is left out of that page's grid.
//!
//! An event starts at local midnight of its `start_date`, so once that day
//! has begun the event counts as past.

use chrono::NaiveDateTime;
use elephant_client::Event;

/// Default number of events per page
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Whether `event` starts at or after `now` (local wall-clock time)
#[must_use]
pub fn is_upcoming(event: &Event, now: NaiveDateTime) -> bool {
    event
        .start_date
        .and_hms_opt(0, 0, 0)
        .is_some_and(|start| start >= now)
}

/// Upcoming events ascending, then past events descending
#[must_use]
pub fn order_events(events: Vec<Event>, now: NaiveDateTime) -> Vec<Event> {
    let (mut upcoming, mut past): (Vec<Event>, Vec<Event>) =
        events.into_iter().partition(|e| is_upcoming(e, now));

    upcoming.sort_by_key(|e| e.start_date);
    past.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    upcoming.extend(past);
    upcoming
}

/// One rendered page of the listing
#[derive(Clone, Debug, PartialEq)]
pub struct EventPage {
    /// The soonest upcoming event; only set on page 1
    pub featured: Option<Event>,
    /// Grid entries of this page
    pub events: Vec<Event>,
    /// Current page (1-based, already clamped)
    pub page: usize,
    /// Total number of pages (at least 1)
    pub total_pages: usize,
}

/// Slice an ordered listing into one page
///
/// `page` is 1-based and clamped into `1..=total_pages`. A page size of zero
/// is treated as one.
#[must_use]
pub fn paginate(ordered: &[Event], page: usize, page_size: usize, now: NaiveDateTime) -> EventPage {
    let page_size = page_size.max(1);
    let total_pages = ordered.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(ordered.len());
    let mut events = ordered.get(start..end).unwrap_or_default().to_vec();

    let featured = if page == 1 {
        ordered.first().filter(|e| is_upcoming(e, now)).cloned()
    } else {
        None
    };
    if let Some(featured) = &featured {
        events.retain(|e| e.id != featured.id);
    }

    EventPage {
        featured,
        events,
        page,
        total_pages,
    }
}
