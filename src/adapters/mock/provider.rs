//! Scriptable mock completion provider for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::mpsc;

use crate::error::ProviderStreamError;
use crate::models::CompletionRequest;
use crate::traits::{CompletionProvider, ProviderEvent, ProviderEventStream};

/// One scripted response, consumed per `stream_completion` call.
enum MockResponse {
    /// A fixed sequence of stream items.
    Stream(Vec<Result<ProviderEvent, ProviderStreamError>>),
    /// Fail before the stream opens.
    OpenError(ProviderStreamError),
    /// Items arrive over a channel, so the test controls pacing.
    Channel(mpsc::UnboundedReceiver<Result<ProviderEvent, ProviderStreamError>>),
}

/// Mock [`CompletionProvider`] with scripted responses.
///
/// Responses are consumed in FIFO order. Every request and every cancelled
/// session id is recorded for assertions.
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
    cancelled: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a stream of fixed items.
    pub fn enqueue_stream(&self, items: Vec<Result<ProviderEvent, ProviderStreamError>>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Stream(items));
    }

    /// Script a stream of deltas ending in `Done`.
    pub fn enqueue_deltas(&self, deltas: &[&str]) {
        let mut items: Vec<Result<ProviderEvent, ProviderStreamError>> = deltas
            .iter()
            .map(|d| Ok(ProviderEvent::Delta(d.to_string())))
            .collect();
        items.push(Ok(ProviderEvent::Done));
        self.enqueue_stream(items);
    }

    /// Script a failure at stream open.
    pub fn enqueue_open_error(&self, error: ProviderStreamError) {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::OpenError(error));
    }

    /// Script a channel-fed stream; the returned sender drives it. Dropping
    /// the sender ends the stream.
    pub fn enqueue_channel(
        &self,
    ) -> mpsc::UnboundedSender<Result<ProviderEvent, ProviderStreamError>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Channel(rx));
        tx
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Session ids passed to `cancel`.
    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderEventStream, ProviderStreamError> {
        self.requests.lock().unwrap().push(request.clone());

        let response = self.responses.lock().unwrap().pop_front();
        match response {
            Some(MockResponse::Stream(items)) => Ok(Box::pin(stream::iter(items))),
            Some(MockResponse::OpenError(error)) => Err(error),
            Some(MockResponse::Channel(rx)) => {
                let event_stream = stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                });
                Ok(Box::pin(event_stream))
            }
            None => Ok(Box::pin(stream::iter(vec![Ok(ProviderEvent::Done)]))),
        }
    }

    async fn cancel(&self, session_id: &str) -> Result<(), ProviderStreamError> {
        self.cancelled.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}
