//! Unified error handling for scenechat.
//!
//! This module provides:
//!
//! - **Domain-specific errors**: turn validation ([`TurnError`]), provider
//!   streaming ([`ProviderStreamError`]), and persistence ([`StoreError`])
//! - **Unified error type**: [`ChatError`] consolidates all error types
//! - **Error categories**: high-level classification for handling decisions
//!
//! Propagation policy: validation errors fail fast before any side effect.
//! Provider stream errors are converted into a visible, persisted assistant
//! message by the orchestrator rather than surfaced as exceptions; the chat
//! thread is the error channel. Store errors propagate without retry.

mod stream;
mod store;
mod turn;

pub use stream::ProviderStreamError;
pub use store::StoreError;
pub use turn::TurnError;

use std::fmt;

/// High-level error category, used for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-side validation problem; never retryable.
    Validation,
    /// Network or provider problem; often retryable.
    Network,
    /// Persistence problem; the in-memory state stays correct.
    Storage,
    /// Programming-contract violation inside the client.
    Client,
}

/// Unified error type for all scenechat operations.
#[derive(Debug)]
pub enum ChatError {
    /// Turn validation or state-machine error.
    Turn(TurnError),
    /// Streaming provider error.
    Stream(ProviderStreamError),
    /// Conversation store error.
    Store(StoreError),
}

impl ChatError {
    /// Get the error category for handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Turn(TurnError::InvalidState { .. }) => ErrorCategory::Client,
            ChatError::Turn(_) => ErrorCategory::Validation,
            ChatError::Stream(_) => ErrorCategory::Network,
            ChatError::Store(_) => ErrorCategory::Storage,
        }
    }

    /// Check if the failed operation is likely to succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Stream(err) => err.is_retryable(),
            ChatError::Store(StoreError::Io(_)) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Turn(err) => err.user_message(),
            ChatError::Stream(err) => err.user_message(),
            ChatError::Store(err) => err.user_message(),
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Turn(err) => write!(f, "{}", err),
            ChatError::Stream(err) => write!(f, "{}", err),
            ChatError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::Turn(err) => Some(err),
            ChatError::Stream(err) => Some(err),
            ChatError::Store(err) => Some(err),
        }
    }
}

impl From<TurnError> for ChatError {
    fn from(err: TurnError) -> Self {
        ChatError::Turn(err)
    }
}

impl From<ProviderStreamError> for ChatError {
    fn from(err: ProviderStreamError) -> Self {
        ChatError::Stream(err)
    }
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        ChatError::Store(err)
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_error_unification() {
        let turn_err: ChatError = TurnError::EmptyInput.into();
        let stream_err: ChatError = ProviderStreamError::ConnectionFailed {
            message: "refused".to_string(),
        }
        .into();
        let store_err: ChatError = StoreError::NotFound {
            id: "conv-1".to_string(),
        }
        .into();

        assert_eq!(turn_err.category(), ErrorCategory::Validation);
        assert_eq!(stream_err.category(), ErrorCategory::Network);
        assert_eq!(store_err.category(), ErrorCategory::Storage);

        assert!(!turn_err.user_message().is_empty());
        assert!(!stream_err.user_message().is_empty());
        assert!(!store_err.user_message().is_empty());
    }

    #[test]
    fn test_invalid_state_is_client_category() {
        let err: ChatError = TurnError::InvalidState {
            operation: "append",
            state: "Complete",
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Client);
    }

    #[test]
    fn test_retry_logic() {
        let retryable: ChatError = ProviderStreamError::Interrupted {
            message: "reset".to_string(),
        }
        .into();
        assert!(retryable.is_retryable());

        let not_retryable: ChatError = TurnError::EmptyInput.into();
        assert!(!not_retryable.is_retryable());
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let err: ChatError = TurnError::EmptyInput.into();
        assert!(err.source().is_some());
    }
}
