//! Provider streaming error types.
//!
//! These errors cover the lifetime of a streaming completion call: opening
//! the connection, parsing the event stream, and terminal errors reported by
//! the provider itself.

use std::fmt;

use crate::sse::SseParseError;

/// Errors surfaced by a streaming completion provider.
#[derive(Debug, Clone)]
pub enum ProviderStreamError {
    /// Could not reach the provider at all.
    ConnectionFailed { message: String },

    /// Provider returned a non-success HTTP status before streaming began.
    HttpStatus { status: u16, message: String },

    /// The event stream could not be parsed.
    Parse(SseParseError),

    /// The provider reported an error as a terminal stream event,
    /// distinguishable from normal completion.
    Provider {
        code: Option<String>,
        message: String,
    },

    /// The transport failed mid-stream after deltas had been received.
    Interrupted { message: String },
}

impl ProviderStreamError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderStreamError::ConnectionFailed { .. }
            | ProviderStreamError::Interrupted { .. } => true,
            ProviderStreamError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get a user-friendly error message, suitable for showing in the chat
    /// thread in place of a response.
    pub fn user_message(&self) -> String {
        match self {
            ProviderStreamError::ConnectionFailed { .. } => {
                "Could not reach the AI service. Please check your connection and try again."
                    .to_string()
            }
            ProviderStreamError::HttpStatus { status, .. } => {
                format!("The AI service returned an error (status {}). Please try again.", status)
            }
            ProviderStreamError::Parse(_) => {
                "Received invalid data from the AI service. Please try again.".to_string()
            }
            ProviderStreamError::Provider { message, .. } => {
                format!("The AI service reported a problem: {}", message)
            }
            ProviderStreamError::Interrupted { .. } => {
                "The response was interrupted before it finished. Please try again.".to_string()
            }
        }
    }
}

impl fmt::Display for ProviderStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStreamError::ConnectionFailed { message } => {
                write!(f, "Connection failed: {}", message)
            }
            ProviderStreamError::HttpStatus { status, message } => {
                write!(f, "Provider error ({}): {}", status, message)
            }
            ProviderStreamError::Parse(err) => write!(f, "Stream parse error: {}", err),
            ProviderStreamError::Provider { code, message } => match code {
                Some(code) => write!(f, "Provider error [{}]: {}", code, message),
                None => write!(f, "Provider error: {}", message),
            },
            ProviderStreamError::Interrupted { message } => {
                write!(f, "Stream interrupted: {}", message)
            }
        }
    }
}

impl std::error::Error for ProviderStreamError {}

impl From<SseParseError> for ProviderStreamError {
    fn from(err: SseParseError) -> Self {
        ProviderStreamError::Parse(err)
    }
}

impl From<reqwest::Error> for ProviderStreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ProviderStreamError::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            ProviderStreamError::Interrupted {
                message: err.to_string(),
            }
        }
    }
}
