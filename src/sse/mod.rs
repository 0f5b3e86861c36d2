//! Server-Sent Events parsing for the streaming completion protocol.

mod events;
mod parser;

pub use events::{SseEvent, SseLine, SseParseError};
pub use parser::{parse_sse_event, parse_sse_line, SseParser};
