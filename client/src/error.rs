//! Error types for the backend client

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the ticketing backend
///
/// Every failure is surfaced exactly once; the client never retries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Unauthorized - session cookie missing or expired
    #[error("Authentication failed")]
    Unauthorized,

    /// Resource does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Error message from the backend
        message: String,
    },

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
        /// Machine-readable error kind, when the backend sends one
        code: Option<String>,
        /// Offending form field, when the backend sends one
        field: Option<String>,
    },
}

impl ApiError {
    /// Whether this is an authentication failure (HTTP 401)
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status, if a response was received
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            Self::RequestFailed(_) | Self::ResponseParseFailed(_) => None,
        }
    }

    /// The backend's own message text, without the status prefix
    #[must_use]
    pub fn server_message(&self) -> &str {
        match self {
            Self::Unauthorized => "Authentication failed",
            Self::NotFound { message } | Self::Api { message, .. } => message,
            Self::RequestFailed(message) | Self::ResponseParseFailed(message) => message,
        }
    }

    /// Build the error for a non-2xx response from its status and raw body
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::Unauthorized;
        }

        let parsed = ErrorBody::parse(status, body);
        if status == 404 {
            Self::NotFound {
                message: parsed.message,
            }
        } else {
            Self::Api {
                status,
                message: parsed.message,
                code: parsed.code,
                field: parsed.field,
            }
        }
    }
}

/// Message, code and field extracted from an error body
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ErrorBody {
    pub message: String,
    pub code: Option<String>,
    pub field: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        field: Option<String>,
    },
    Text(String),
}

impl ErrorBody {
    /// Parse `{error:{message}}`, `{message}`, `{error:"..."}` or plain text
    pub(crate) fn parse(status: u16, body: &str) -> Self {
        let fallback = || format!("HTTP {status}");

        if let Ok(envelope) = serde_json::from_str::<Envelope>(body) {
            let (message, code, field) = match envelope.error {
                Some(ErrorDetail::Structured {
                    message,
                    code,
                    field,
                }) => (message, code, field),
                Some(ErrorDetail::Text(text)) => (Some(text), None, None),
                None => (None, None, None),
            };

            return Self {
                message: message
                    .or(envelope.message)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(fallback),
                code,
                field,
            };
        }

        let text = body.trim();
        Self {
            message: if text.is_empty() {
                fallback()
            } else {
                text.to_string()
            },
            code: None,
            field: None,
        }
    }
}
