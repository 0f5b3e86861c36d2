//! SSE parsing logic.
//!
//! The parser is stateful: it accumulates `event:` and `data:` lines until an
//! empty line marks the end of an event, then emits the typed [`SseEvent`].
//! A data-only event (no `event:` line) is dispatched on the `type` field of
//! its JSON payload.

use serde::Deserialize;

use super::events::{SseEvent, SseLine, SseParseError};

/// Payload of a `delta` event.
#[derive(Debug, Deserialize)]
struct DeltaPayload {
    text: String,
}

/// Payload of an `error` event.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Data-only payload carrying its own event type.
#[derive(Debug, Deserialize)]
struct TypedPayload {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Classify a single raw line from an SSE stream.
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        SseLine::Empty
    } else if let Some(rest) = line.strip_prefix("event:") {
        SseLine::Event(rest.trim().to_string())
    } else if let Some(rest) = line.strip_prefix("data:") {
        SseLine::Data(rest.trim_start().to_string())
    } else {
        // Comments and anything unrecognized are ignored.
        SseLine::Comment
    }
}

/// Assemble a typed event from an accumulated event type and data payload.
pub fn parse_sse_event(
    event_type: &str,
    data: Option<&str>,
) -> Result<SseEvent, SseParseError> {
    match event_type {
        "delta" | "content" => {
            let data = data.ok_or_else(|| SseParseError::MissingData {
                event_type: event_type.to_string(),
            })?;
            let payload: DeltaPayload =
                serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
                    event_type: event_type.to_string(),
                    source: e.to_string(),
                })?;
            Ok(SseEvent::Delta { text: payload.text })
        }
        "done" => Ok(SseEvent::Done),
        "error" => {
            let data = data.ok_or_else(|| SseParseError::MissingData {
                event_type: event_type.to_string(),
            })?;
            let payload: ErrorPayload =
                serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
                    event_type: event_type.to_string(),
                    source: e.to_string(),
                })?;
            Ok(SseEvent::Error {
                message: payload.message,
                code: payload.code,
            })
        }
        "ping" => Ok(SseEvent::Ping),
        other => Err(SseParseError::UnknownEventType(other.to_string())),
    }
}

/// Stateful SSE stream parser.
///
/// Feed lines one at a time with [`SseParser::feed_line`]; a complete event
/// is returned when the terminating empty line arrives.
#[derive(Debug, Default)]
pub struct SseParser {
    event_type: Option<String>,
    data_lines: Vec<String>,
}

impl SseParser {
    /// Create a new parser with no accumulated state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line to the parser, potentially returning a complete event.
    ///
    /// Returns `Ok(None)` when the line was consumed but no complete event
    /// exists yet.
    pub fn feed_line(&mut self, line: &str) -> Result<Option<SseEvent>, SseParseError> {
        match parse_sse_line(line) {
            SseLine::Event(event_type) => {
                self.event_type = Some(event_type);
                Ok(None)
            }
            SseLine::Data(data) => {
                self.data_lines.push(data);
                Ok(None)
            }
            SseLine::Comment => Ok(None),
            SseLine::Empty => self.dispatch(),
        }
    }

    /// Reset the parser state, discarding any partially accumulated event.
    pub fn reset(&mut self) {
        self.event_type = None;
        self.data_lines.clear();
    }

    fn dispatch(&mut self) -> Result<Option<SseEvent>, SseParseError> {
        let event_type = self.event_type.take();
        let data = if self.data_lines.is_empty() {
            None
        } else {
            Some(self.data_lines.join("\n"))
        };
        self.data_lines.clear();

        match (event_type, data) {
            (None, None) => Ok(None),
            (Some(event_type), data) => {
                parse_sse_event(&event_type, data.as_deref()).map(Some)
            }
            (None, Some(data)) => {
                // Data-only event: the payload carries its own type.
                let payload: TypedPayload =
                    serde_json::from_str(&data).map_err(|e| SseParseError::InvalidJson {
                        event_type: "<untyped>".to_string(),
                        source: e.to_string(),
                    })?;
                match payload.event_type.as_str() {
                    "delta" | "content" => Ok(Some(SseEvent::Delta {
                        text: payload.text.unwrap_or_default(),
                    })),
                    "done" => Ok(Some(SseEvent::Done)),
                    "error" => Ok(Some(SseEvent::Error {
                        message: payload.message.unwrap_or_default(),
                        code: payload.code,
                    })),
                    "ping" => Ok(Some(SseEvent::Ping)),
                    other => Err(SseParseError::UnknownEventType(other.to_string())),
                }
            }
        }
    }
}
