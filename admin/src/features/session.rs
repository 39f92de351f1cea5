//! Admin login and logout
//!
//! The backend keeps the session in an HTTP-only cookie held by the client's
//! cookie jar, so a successful login only has to move on to the dashboard.

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::page::Route;
use elephant_client::{ApiError, Credentials};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};

const LOGIN_FAILED: &str = "Login failed";
const UNEXPECTED: &str = "An unexpected error occurred.";

/// Message shown for a failed login
#[must_use]
pub fn login_error_message(error: &ApiError) -> String {
    match error {
        ApiError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
        ApiError::RequestFailed(_) | ApiError::ResponseParseFailed(_) => UNEXPECTED.to_string(),
        _ => LOGIN_FAILED.to_string(),
    }
}

/// Login page state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Username input
    pub username: String,
    /// Password input
    pub password: String,
    /// Request in flight; inputs are disabled
    pub submitting: bool,
    /// Last login error
    pub error: Option<String>,
    /// Login succeeded
    pub logged_in: bool,
    /// Where the page wants to go
    pub redirect: Option<Route>,
}

/// Session actions
#[derive(Clone, Debug)]
pub enum SessionAction {
    /// Username input changed
    SetUsername(String),
    /// Password input changed
    SetPassword(String),
    /// Log in with the current inputs
    Login,
    /// Backend answered the login
    LoggedIn {
        /// Outcome
        result: Result<(), ApiError>,
    },
    /// End the session
    Logout,
    /// Backend answered the logout
    LoggedOut {
        /// Outcome
        result: Result<(), ApiError>,
    },
}

/// Session reducer
#[derive(Clone, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut SessionState,
        action: SessionAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<SessionAction>; 4]> {
        match action {
            SessionAction::SetUsername(username) => {
                state.username = username;
                smallvec![Effect::None]
            },

            SessionAction::SetPassword(password) => {
                state.password = password;
                smallvec![Effect::None]
            },

            SessionAction::Login => {
                if state.submitting {
                    return smallvec![Effect::None];
                }
                if state.username.is_empty() || state.password.is_empty() {
                    state.error = Some("Username and password are required".to_string());
                    return smallvec![Effect::None];
                }
                state.submitting = true;
                state.error = None;
                let credentials = Credentials {
                    username: state.username.clone(),
                    password: state.password.clone(),
                };
                smallvec![request(env.backend().login(credentials), |result| {
                    SessionAction::LoggedIn { result }
                })]
            },

            SessionAction::LoggedIn { result } => {
                state.submitting = false;
                match result {
                    Ok(()) => {
                        state.logged_in = true;
                        state.password.clear();
                        state.redirect = Some(Route::AdminDashboard);
                    },
                    Err(error) => {
                        tracing::warn!(%error, username = %state.username, "Login failed");
                        state.error = Some(login_error_message(&error));
                    },
                }
                smallvec![Effect::None]
            },

            SessionAction::Logout => {
                smallvec![request(env.backend().logout(), |result| {
                    SessionAction::LoggedOut { result }
                })]
            },

            SessionAction::LoggedOut { result } => {
                if let Err(error) = result {
                    tracing::warn!(%error, "Logout request failed");
                }
                state.logged_in = false;
                state.redirect = Some(Route::AdminLogin);
                smallvec![Effect::None]
            },
        }
    }
}
