//! Runtime configuration.
//!
//! Values come from environment variables with sensible defaults, so the
//! binary runs with zero setup against a local backend.

use std::path::PathBuf;

use crate::adapters::{JsonFileStore, DEFAULT_BASE_URL};
use crate::models::default_library;

/// Model requested when a conversation does not pin one.
pub const DEFAULT_MODEL: &str = "scene-coder-v1";

/// Runtime configuration for the client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion backend base URL.
    pub base_url: String,
    /// Default model name.
    pub model: String,
    /// Default scene library id for new conversations.
    pub library_id: String,
    /// Directory holding conversation files.
    pub data_dir: PathBuf,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            library_id: default_library().id.to_string(),
            data_dir: JsonFileStore::default_dir(),
            temperature: None,
            top_p: None,
        }
    }
}

impl Config {
    /// Build configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `SCENECHAT_BASE_URL`, `SCENECHAT_MODEL`,
    /// `SCENECHAT_LIBRARY`, `SCENECHAT_DATA_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("SCENECHAT_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(model) = std::env::var("SCENECHAT_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        if let Ok(library) = std::env::var("SCENECHAT_LIBRARY") {
            if !library.trim().is_empty() {
                config.library_id = library.trim().to_string();
            }
        }
        if let Ok(data_dir) = std::env::var("SCENECHAT_DATA_DIR") {
            if !data_dir.trim().is_empty() {
                config.data_dir = PathBuf::from(data_dir.trim());
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}
