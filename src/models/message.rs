//! Chat message model with threaded replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single message in a conversation.
///
/// Threading is single-level: a message either is top-level
/// (`thread_parent_id` is `None`) or replies to a top-level message. Reply
/// ids are mirrored in the parent's `replies` list so a thread can be walked
/// without scanning the whole conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    /// Parent message id when this message lives inside a thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_parent_id: Option<String>,
    /// Ids of direct replies, in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<String>,
    /// Scene library this message targets, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_id: Option<String>,
}

impl Message {
    /// Create a new top-level user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }

    /// Create a new top-level assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }

    fn new(content: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            is_user,
            timestamp: Utc::now(),
            thread_parent_id: None,
            replies: Vec::new(),
            library_id: None,
        }
    }

    /// Attach this message to a thread parent.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.thread_parent_id = Some(parent_id.into());
        self
    }

    /// Tag this message with a scene library.
    pub fn with_library(mut self, library_id: impl Into<String>) -> Self {
        self.library_id = Some(library_id.into());
        self
    }

    /// Whether this message sits at the top level of the conversation.
    pub fn is_top_level(&self) -> bool {
        self.thread_parent_id.is_none()
    }
}
