//! Turn validation and state-machine errors.
//!
//! These errors fail fast, before any network call or persisted side effect.

use std::fmt;

/// Errors raised while validating or driving a single chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// User submitted blank text. Rejected before any side effect.
    EmptyInput,

    /// An explicit reply target does not exist in the conversation.
    ParentNotFound { parent_id: String },

    /// A turn is already in flight for this conversation.
    TurnInProgress { conversation_id: String },

    /// A component was driven outside its state machine (e.g. appending to a
    /// finalized stream accumulator). Programming-contract violation, not
    /// user-facing.
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

impl TurnError {
    /// Stable error code for logging and diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            TurnError::EmptyInput => "empty_input",
            TurnError::ParentNotFound { .. } => "parent_not_found",
            TurnError::TurnInProgress { .. } => "turn_in_progress",
            TurnError::InvalidState { .. } => "invalid_state",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            TurnError::EmptyInput => "Please enter a message before sending.".to_string(),
            TurnError::ParentNotFound { .. } => {
                "The message you tried to reply to no longer exists.".to_string()
            }
            TurnError::TurnInProgress { .. } => {
                "Please wait for the current response to complete before sending another message."
                    .to_string()
            }
            TurnError::InvalidState { .. } => {
                "An internal error occurred. Please try again.".to_string()
            }
        }
    }
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::EmptyInput => write!(f, "Input is empty after trimming"),
            TurnError::ParentNotFound { parent_id } => {
                write!(f, "Reply parent not found: {}", parent_id)
            }
            TurnError::TurnInProgress { conversation_id } => {
                write!(f, "A turn is already in flight for conversation {}", conversation_id)
            }
            TurnError::InvalidState { operation, state } => {
                write!(f, "Invalid operation '{}' in state {}", operation, state)
            }
        }
    }
}

impl std::error::Error for TurnError {}
