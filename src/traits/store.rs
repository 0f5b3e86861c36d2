//! Conversation persistence contract.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Conversation;

/// Contract for conversation persistence.
///
/// `save` is an upsert for new conversations; `update` requires the
/// conversation to already exist and fails with [`StoreError::NotFound`]
/// otherwise. `list` and `search` order results by `updated_at`, newest
/// first.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist a conversation, creating or replacing it.
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Replace an existing conversation.
    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Load a conversation by id.
    async fn load(&self, id: &str) -> Result<Conversation, StoreError>;

    /// Delete a conversation by id.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Delete every stored conversation.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Case-insensitive search over titles and message contents.
    async fn search(&self, query: &str) -> Result<Vec<Conversation>, StoreError>;

    /// List all conversations, most recently updated first.
    async fn list(&self) -> Result<Vec<Conversation>, StoreError>;
}
