//! Trait seams between the orchestrator and its backends.

mod provider;
mod store;

pub use provider::{CompletionProvider, ProviderEvent, ProviderEventStream};
pub use store::ConversationStore;
