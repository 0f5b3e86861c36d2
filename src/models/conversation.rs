//! Conversation model: an ordered message list with single-level threading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TurnError;
use crate::models::Message;

/// Title given to a conversation before any user message arrives.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Maximum generated title length before the first line is ellipsized.
const TITLE_MAX_LEN: usize = 50;

/// A conversation: metadata plus the full message list in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Scene library this conversation targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_id: Option<String>,
    /// Model that produced the assistant messages, if pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl Conversation {
    /// Create an empty conversation with the default title.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            library_id: None,
            model_used: None,
        }
    }

    /// Pin a scene library on the conversation.
    pub fn with_library(mut self, library_id: impl Into<String>) -> Self {
        self.library_id = Some(library_id.into());
        self
    }

    /// Pin a model on the conversation.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_used = Some(model.into());
        self
    }

    /// Messages that are not replies, in arrival order.
    pub fn top_level_messages(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.is_top_level()).collect()
    }

    /// Direct replies to the given message, resolved through the parent's
    /// `replies` id list, in arrival order.
    ///
    /// An unknown parent id yields an empty list, and dangling reply ids are
    /// skipped; reads are lenient where writes are strict.
    pub fn replies(&self, parent_id: &str) -> Vec<&Message> {
        let Some(parent) = self.message(parent_id) else {
            return Vec::new();
        };
        parent
            .replies
            .iter()
            .filter_map(|id| self.message(id))
            .collect()
    }

    /// Look up a message by id.
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Append a message, wiring up threading metadata.
    ///
    /// When the message names a thread parent, the parent must already exist
    /// in this conversation; otherwise nothing is mutated and
    /// [`TurnError::ParentNotFound`] is returned.
    pub fn append_message(&mut self, message: Message) -> Result<(), TurnError> {
        if let Some(parent_id) = message.thread_parent_id.clone() {
            let parent = self
                .messages
                .iter_mut()
                .find(|m| m.id == parent_id)
                .ok_or(TurnError::ParentNotFound { parent_id })?;
            parent.replies.push(message.id.clone());
        }
        self.messages.push(message);
        self.touch();
        Ok(())
    }

    /// Derive a title from the first user message, once.
    ///
    /// Only runs while the title is empty or still [`DEFAULT_TITLE`];
    /// regenerating is a no-op, so later edits to the title survive new
    /// messages.
    pub fn generate_title_if_needed(&mut self) {
        if self.title != DEFAULT_TITLE && !self.title.is_empty() {
            return;
        }
        let Some(first_user) = self.messages.iter().find(|m| m.is_user) else {
            return;
        };
        let first_line = first_user.content.lines().next().unwrap_or("").trim();
        if first_line.is_empty() {
            return;
        }
        self.title = if first_line.chars().count() > TITLE_MAX_LEN {
            let truncated: String = first_line.chars().take(TITLE_MAX_LEN).collect();
            format!("{}...", truncated.trim_end())
        } else {
            first_line.to_string()
        };
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
