//! SSE event type definitions.

use std::fmt;

/// A parsed line from an SSE stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// `event: <type>` line
    Event(String),
    /// `data: <payload>` line
    Data(String),
    /// `: comment` line, ignored
    Comment,
    /// Empty line, signals end of event
    Empty,
}

/// A complete event from the provider's SSE stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A text delta of the streamed response.
    Delta { text: String },
    /// Normal completion of the stream.
    Done,
    /// Terminal error reported by the provider, distinguishable from
    /// normal completion.
    Error {
        message: String,
        code: Option<String>,
    },
    /// Keep-alive, carries no content.
    Ping,
}

/// SSE parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseParseError {
    /// Unknown event type received
    UnknownEventType(String),
    /// Invalid JSON in data payload
    InvalidJson { event_type: String, source: String },
    /// Missing data for an event type that requires it
    MissingData { event_type: String },
}

impl fmt::Display for SseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SseParseError::UnknownEventType(t) => write!(f, "Unknown SSE event type: {}", t),
            SseParseError::InvalidJson { event_type, source } => {
                write!(f, "Invalid JSON for event '{}': {}", event_type, source)
            }
            SseParseError::MissingData { event_type } => {
                write!(f, "Missing data for event type: {}", event_type)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
