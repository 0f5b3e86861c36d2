//! In-memory conversation store for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Conversation;
use crate::traits::ConversationStore;

/// In-memory [`ConversationStore`] with operation recording and fault
/// injection.
#[derive(Default)]
pub struct InMemoryStore {
    conversations: Mutex<HashMap<String, Conversation>>,
    operations: Mutex<Vec<String>>,
    fail_next_save: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `save` or `update` fail with an IO error.
    pub fn fail_next_save(&self) {
        *self.fail_next_save.lock().unwrap() = true;
    }

    /// Operation names recorded so far, in call order.
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    fn record(&self, op: &str) {
        self.operations.lock().unwrap().push(op.to_string());
    }

    fn take_injected_failure(&self) -> Option<StoreError> {
        let mut flag = self.fail_next_save.lock().unwrap();
        if *flag {
            *flag = false;
            Some(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected failure",
            )))
        } else {
            None
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.record("save");
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.record("update");
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let mut conversations = self.conversations.lock().unwrap();
        if !conversations.contains_key(&conversation.id) {
            return Err(StoreError::NotFound {
                id: conversation.id.clone(),
            });
        }
        conversations.insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Conversation, StoreError> {
        self.record("load");
        self.conversations
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.record("delete");
        self.conversations
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.record("delete_all");
        self.conversations.lock().unwrap().clear();
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Conversation>, StoreError> {
        self.record("search");
        let needle = query.to_lowercase();
        let mut hits: Vec<Conversation> = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| {
                c.title.to_lowercase().contains(&needle)
                    || c.messages
                        .iter()
                        .any(|m| m.content.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(hits)
    }

    async fn list(&self) -> Result<Vec<Conversation>, StoreError> {
        self.record("list");
        let mut all: Vec<Conversation> = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }
}
