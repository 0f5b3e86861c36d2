//! Persistence error types for the conversation store.

use thiserror::Error;

/// Errors surfaced by a [`crate::traits::ConversationStore`] implementation.
///
/// Store errors are propagated to the caller without automatic retry; the
/// in-memory conversation remains correct even when a save fails, so a later
/// save can recover.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No conversation with the given id exists in the store.
    #[error("conversation not found: {id}")]
    NotFound { id: String },

    /// Reading or writing the underlying storage failed.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A conversation could not be serialized or deserialized.
    #[error("conversation serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::NotFound { .. } => "This conversation no longer exists.".to_string(),
            StoreError::Io(_) => {
                "Could not save the conversation. Your message is kept in memory.".to_string()
            }
            StoreError::Serialization(_) => {
                "Could not read saved conversation data.".to_string()
            }
        }
    }
}
