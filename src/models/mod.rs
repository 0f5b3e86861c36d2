//! Domain models: messages, conversations, scene libraries, and provider
//! requests.

mod conversation;
mod library;
mod message;
mod request;

pub use conversation::{Conversation, DEFAULT_TITLE};
pub use library::{default_library, library_by_id, SceneLibrary, LIBRARIES};
pub use message::Message;
pub use request::CompletionRequest;
