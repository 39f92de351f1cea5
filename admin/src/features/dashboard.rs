//! Admin dashboard: every event, active ones first, inactive ones folded away

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::page::{Loadable, PageError, Route};
use elephant_client::{ApiError, Event};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};

const EVENTS_LOAD_FAILED: &str = "Failed to load events data. Please try again later.";

/// Dashboard state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardState {
    /// Events, most recent start date first
    pub events: Loadable<Vec<Event>>,
    /// Whether the inactive section is expanded
    pub show_inactive: bool,
    /// Where the page wants to go
    pub redirect: Option<Route>,
}

impl DashboardState {
    /// Events open for sales
    #[must_use]
    pub fn active(&self) -> Vec<&Event> {
        self.filtered(true)
    }

    /// Events closed for sales
    #[must_use]
    pub fn inactive(&self) -> Vec<&Event> {
        self.filtered(false)
    }

    fn filtered(&self, is_active: bool) -> Vec<&Event> {
        self.events
            .value()
            .map(|events| events.iter().filter(|e| e.is_active == is_active).collect())
            .unwrap_or_default()
    }
}

/// Dashboard actions
#[derive(Clone, Debug)]
pub enum DashboardAction {
    /// Fetch all events
    Load,
    /// Events fetched
    Loaded {
        /// Events in backend order
        result: Result<Vec<Event>, ApiError>,
    },
    /// Expand or fold the inactive section
    ToggleInactive,
    /// Go somewhere else
    Navigate(Route),
}

/// Dashboard reducer
#[derive(Clone, Debug, Default)]
pub struct DashboardReducer;

impl DashboardReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for DashboardReducer {
    type State = DashboardState;
    type Action = DashboardAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut DashboardState,
        action: DashboardAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<DashboardAction>; 4]> {
        match action {
            DashboardAction::Load => {
                state.events = Loadable::Loading;
                smallvec![request(env.backend().admin_events(), |result| {
                    DashboardAction::Loaded { result }
                })]
            },
            DashboardAction::Loaded { result: Ok(mut events) } => {
                events.sort_by(|a, b| b.start_date.cmp(&a.start_date));
                state.events = Loadable::Loaded(events);
                smallvec![Effect::None]
            },
            DashboardAction::Loaded { result: Err(error) } => {
                let error = PageError::load(&error, EVENTS_LOAD_FAILED);
                let effect = error.follow_up(env.redirect_delay(), DashboardAction::Navigate);
                state.events = Loadable::Failed(error);
                smallvec![effect]
            },
            DashboardAction::ToggleInactive => {
                state.show_inactive = !state.show_inactive;
                smallvec![Effect::None]
            },
            DashboardAction::Navigate(route) => {
                state.redirect = Some(route);
                smallvec![Effect::None]
            },
        }
    }
}
