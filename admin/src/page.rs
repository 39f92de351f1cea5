//! Building blocks shared by every page: routes, load state, page errors

use crate::field_errors::FieldErrors;
use elephant_client::{ApiError, EventId};
use elephant_core::delay;
use elephant_core::effect::Effect;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Message shown while waiting to be sent to the login page
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Redirecting to login...";

/// Generic load failure
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data. Please try again later.";

/// Event page opened for an id the backend does not know
pub const EVENT_NOT_FOUND_MESSAGE: &str = "Event not found";

/// Event page load failure
pub const EVENT_LOAD_FAILED_MESSAGE: &str = "Failed to load event data. Please try again later.";

/// Places a page can send the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Public event listing
    Home,
    /// Public event page
    Event(EventId),
    /// Admin login
    AdminLogin,
    /// Admin event dashboard
    AdminDashboard,
    /// Admin event editor
    AdminEvent(EventId),
    /// Ticket desk of an event
    AdminTickets(EventId),
    /// Door list of an event
    AdminDoor(EventId),
    /// Report downloads of an event
    AdminDownloads(EventId),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Event(id) => write!(f, "/events/{id}"),
            Self::AdminLogin => f.write_str("/admin/login"),
            Self::AdminDashboard => f.write_str("/admin"),
            Self::AdminEvent(id) => write!(f, "/admin/events/{id}"),
            Self::AdminTickets(id) => write!(f, "/admin/events/{id}/tickets"),
            Self::AdminDoor(id) => write!(f, "/admin/events/{id}/door"),
            Self::AdminDownloads(id) => write!(f, "/admin/events/{id}/downloads"),
        }
    }
}

/// Why a page could not do what was asked
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PageError {
    /// Session missing or expired; a redirect to login is scheduled
    #[error("Authentication required. Redirecting to login...")]
    AuthRequired,

    /// The resource does not exist (any more)
    #[error("{0}")]
    NotFound(String),

    /// Network failure or a backend error without field detail
    #[error("{0}")]
    Transport(String),

    /// Form input rejected, locally or by the backend
    #[error("{0}")]
    Validation(FieldErrors),
}

impl PageError {
    /// Error for a failed initial load
    ///
    /// Details of the failure are not shown, only `failed`.
    #[must_use]
    pub fn load(error: &ApiError, failed: &str) -> Self {
        tracing::warn!(%error, "Page load failed");
        if error.is_unauthorized() {
            Self::AuthRequired
        } else {
            Self::Transport(failed.to_string())
        }
    }

    /// Error for a failed load of a page about one event
    #[must_use]
    pub fn load_event(error: &ApiError) -> Self {
        match error {
            ApiError::NotFound { .. } => {
                tracing::warn!(%error, "Event not found");
                Self::NotFound(EVENT_NOT_FOUND_MESSAGE.to_string())
            },
            _ => Self::load(error, EVENT_LOAD_FAILED_MESSAGE),
        }
    }

    /// Error for a failed mutation
    ///
    /// The backend's own message is shown when there is one, `fallback` otherwise.
    #[must_use]
    pub fn action(error: &ApiError, fallback: &str) -> Self {
        tracing::warn!(%error, "Page action failed");
        match error {
            ApiError::Unauthorized => Self::AuthRequired,
            ApiError::NotFound { message } => Self::NotFound(message.clone()),
            ApiError::Api { message, .. } if !message.trim().is_empty() => {
                Self::Transport(message.clone())
            },
            _ => Self::Transport(fallback.to_string()),
        }
    }

    /// Whether this error sends the user to the login page
    #[must_use]
    pub const fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }

    /// Effect that follows this error: a delayed redirect for auth failures
    #[must_use]
    pub fn follow_up<A>(&self, delay: Duration, navigate: impl FnOnce(Route) -> A) -> Effect<A> {
        if self.is_auth_required() {
            delay! {
                duration: delay,
                action: navigate(Route::AdminLogin)
            }
        } else {
            Effect::None
        }
    }
}

/// Lifecycle of data fetched when a page opens
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Loadable<T> {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Request in flight
    Loading,
    /// Data arrived
    Loaded(T),
    /// Request failed
    Failed(PageError),
}

impl<T> Loadable<T> {
    /// Loaded value, if any
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable loaded value, if any
    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Load error, if any
    #[must_use]
    pub const fn error(&self) -> Option<&PageError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether data arrived
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}
