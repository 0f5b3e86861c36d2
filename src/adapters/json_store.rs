//! JSON file-backed conversation store.
//!
//! One pretty-printed JSON file per conversation, `{id}.json`, under a data
//! directory. Corrupt files are skipped with a warning when listing so one
//! bad file cannot hide the rest of the history.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::error::StoreError;
use crate::models::Conversation;
use crate::traits::ConversationStore;

/// File-per-conversation [`ConversationStore`].
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Platform data directory for conversation storage.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scenechat")
            .join("conversations")
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn write_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(conversation)?;
        tokio::fs::write(self.path_for(&conversation.id), json).await?;
        Ok(())
    }

    async fn read_conversation(&self, path: &Path) -> Result<Conversation, StoreError> {
        let json = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn load_all(&self) -> Result<Vec<Conversation>, StoreError> {
        let mut conversations = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_conversation(&path).await {
                Ok(conversation) => conversations.push(conversation),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable conversation file");
                }
            }
        }
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }
}

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.write_conversation(conversation).await
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let path = self.path_for(&conversation.id);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::NotFound {
                id: conversation.id.clone(),
            });
        }
        self.write_conversation(conversation).await
    }

    async fn load(&self, id: &str) -> Result<Conversation, StoreError> {
        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        self.read_conversation(&path).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound { id: id.to_string() })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                tokio::fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Conversation>, StoreError> {
        let needle = query.to_lowercase();
        let conversations = self.load_all().await?;
        Ok(conversations
            .into_iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&needle)
                    || c.messages
                        .iter()
                        .any(|m| m.content.to_lowercase().contains(&needle))
            })
            .collect())
    }

    async fn list(&self) -> Result<Vec<Conversation>, StoreError> {
        self.load_all().await
    }
}
