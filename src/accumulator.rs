//! Streaming response accumulation.
//!
//! A [`StreamAccumulator`] collects text deltas for one in-flight assistant
//! response and tracks whether a complete code block has appeared in the
//! buffered text so far. It is a one-shot state machine: Idle, then
//! Streaming, then Complete. Misuse is reported as
//! [`TurnError::InvalidState`] rather than panicking.

use crate::error::TurnError;
use crate::extract::extract_code;

/// Lifecycle state of a [`StreamAccumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    /// Created, not yet started.
    Idle,
    /// Accepting deltas.
    Streaming,
    /// Finalized; the buffer has been taken.
    Complete,
}

impl AccumulatorState {
    fn name(&self) -> &'static str {
        match self {
            AccumulatorState::Idle => "Idle",
            AccumulatorState::Streaming => "Streaming",
            AccumulatorState::Complete => "Complete",
        }
    }
}

/// Accumulates streamed deltas for a single assistant response.
#[derive(Debug)]
pub struct StreamAccumulator {
    state: AccumulatorState,
    buffer: String,
    has_code_block: bool,
}

impl StreamAccumulator {
    /// Create a new accumulator in the Idle state.
    pub fn new() -> Self {
        Self {
            state: AccumulatorState::Idle,
            buffer: String::new(),
            has_code_block: false,
        }
    }

    /// Begin accepting deltas.
    pub fn start(&mut self) -> Result<(), TurnError> {
        match self.state {
            AccumulatorState::Idle => {
                self.state = AccumulatorState::Streaming;
                Ok(())
            }
            state => Err(TurnError::InvalidState {
                operation: "start",
                state: state.name(),
            }),
        }
    }

    /// Append a delta to the buffer.
    ///
    /// Returns whether the accumulated text now contains a complete,
    /// extractable code block. The check runs over the whole buffer on each
    /// append because a closing fence may arrive split across deltas.
    pub fn append(&mut self, delta: &str) -> Result<bool, TurnError> {
        match self.state {
            AccumulatorState::Streaming => {
                self.buffer.push_str(delta);
                self.has_code_block = extract_code(&self.buffer).is_some();
                Ok(self.has_code_block)
            }
            state => Err(TurnError::InvalidState {
                operation: "append",
                state: state.name(),
            }),
        }
    }

    /// Finish the stream and take the accumulated text.
    pub fn finalize(&mut self) -> Result<String, TurnError> {
        match self.state {
            AccumulatorState::Streaming => {
                self.state = AccumulatorState::Complete;
                Ok(std::mem::take(&mut self.buffer))
            }
            state => Err(TurnError::InvalidState {
                operation: "finalize",
                state: state.name(),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Text buffered so far. Empty after finalize.
    pub fn buffered_text(&self) -> &str {
        &self.buffer
    }

    /// Whether a complete code block has been seen in the buffered text.
    pub fn has_code_block(&self) -> bool {
        self.has_code_block
    }

    /// Whether the accumulator has been finalized.
    pub fn is_complete(&self) -> bool {
        self.state == AccumulatorState::Complete
    }
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
