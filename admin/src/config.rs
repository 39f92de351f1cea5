//! Console configuration
//!
//! Loaded from environment variables (a `.env` file is read first by the
//! binary) with defaults for everything but the admin credentials.

use chrono::{FixedOffset, Offset, Utc};
use elephant_client::{Credentials, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::environment::{DEFAULT_REDIRECT_DELAY, DEFAULT_UTC_OFFSET_SECS};
use crate::listing::DEFAULT_PAGE_SIZE;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("{var} has an invalid value '{value}'")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// Admin commands need credentials
    #[error("admin credentials are not configured (set ELEPHANT_ADMIN_USERNAME and ELEPHANT_ADMIN_PASSWORD)")]
    MissingCredentials,
}

/// Console configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL, including `/api/v1`
    pub api_url: String,
    /// Admin username
    pub admin_username: Option<String>,
    /// Admin password
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
    /// Directory downloaded reports are written to
    pub report_dir: PathBuf,
    /// Events per page on the public listing
    pub page_size: usize,
    /// Delay before redirecting to login after a 401, in milliseconds
    pub redirect_delay_ms: u64,
    /// Local offset from UTC in seconds, used to decide "today"
    pub utc_offset_secs: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            admin_username: None,
            admin_password: None,
            report_dir: PathBuf::from("reports"),
            page_size: DEFAULT_PAGE_SIZE,
            redirect_delay_ms: u64::try_from(DEFAULT_REDIRECT_DELAY.as_millis()).unwrap_or(1500),
            utc_offset_secs: DEFAULT_UTC_OFFSET_SECS,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric or offset variable
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let page_size = match text("ELEPHANT_PAGE_SIZE") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "ELEPHANT_PAGE_SIZE",
                        value,
                    })
                },
            },
            None => defaults.page_size,
        };

        let redirect_delay_ms = match text("ELEPHANT_REDIRECT_DELAY_MS") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "ELEPHANT_REDIRECT_DELAY_MS",
                value: value.clone(),
            })?,
            None => defaults.redirect_delay_ms,
        };

        let utc_offset_secs = match text("ELEPHANT_UTC_OFFSET") {
            Some(value) => value
                .trim()
                .parse::<FixedOffset>()
                .map(|offset| offset.local_minus_utc())
                .map_err(|_| ConfigError::Invalid {
                    var: "ELEPHANT_UTC_OFFSET",
                    value: value.clone(),
                })?,
            None => defaults.utc_offset_secs,
        };

        Ok(Self {
            api_url: text("ELEPHANT_API_URL").unwrap_or(defaults.api_url),
            admin_username: text("ELEPHANT_ADMIN_USERNAME"),
            admin_password: lookup("ELEPHANT_ADMIN_PASSWORD"),
            report_dir: text("ELEPHANT_REPORT_DIR").map_or(defaults.report_dir, PathBuf::from),
            page_size,
            redirect_delay_ms,
            utc_offset_secs,
        })
    }

    /// Delay before redirecting to login
    #[must_use]
    pub const fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    /// Local offset from UTC
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }

    /// Credentials for admin commands
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] unless both username and
    /// password are set.
    pub fn admin_credentials(&self) -> Result<Credentials, ConfigError> {
        match (&self.admin_username, &self.admin_password) {
            (Some(username), Some(password)) => Ok(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}
