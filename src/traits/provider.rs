//! Streaming completion provider contract.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ProviderStreamError;
use crate::models::CompletionRequest;

/// A normalized event from a streaming completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// A chunk of response text.
    Delta(String),
    /// Normal end of the response.
    Done,
}

/// Stream of provider events. Errors terminate the stream.
pub type ProviderEventStream =
    Pin<Box<dyn Stream<Item = Result<ProviderEvent, ProviderStreamError>> + Send>>;

/// Contract for a streaming completion backend.
///
/// Implementations normalize their wire protocol into [`ProviderEvent`]s.
/// Opening failures are returned from `stream_completion` itself; failures
/// after the stream opens arrive as `Err` items on the stream.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open a streaming completion for the given request.
    async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderEventStream, ProviderStreamError>;

    /// Ask the backend to stop generating for a session. Best effort; the
    /// default implementation does nothing.
    async fn cancel(&self, _session_id: &str) -> Result<(), ProviderStreamError> {
        Ok(())
    }
}
