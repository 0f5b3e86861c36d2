//! HTTP/SSE completion provider.
//!
//! Talks to a streaming completion backend over Server-Sent Events:
//! `POST {base_url}/v1/stream` opens the stream, `POST {base_url}/v1/cancel`
//! asks the backend to stop generating for a session.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ProviderStreamError;
use crate::models::CompletionRequest;
use crate::sse::{SseEvent, SseParser};
use crate::traits::{CompletionProvider, ProviderEvent, ProviderEventStream};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// SSE-backed [`CompletionProvider`].
pub struct SseProviderClient {
    base_url: String,
    client: reqwest::Client,
}

impl SseProviderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Probe the backend's health endpoint.
    pub async fn health_check(&self) -> Result<(), ProviderStreamError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderStreamError::from)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderStreamError::HttpStatus {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            })
        }
    }
}

#[async_trait]
impl CompletionProvider for SseProviderClient {
    async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderEventStream, ProviderStreamError> {
        let url = format!("{}/v1/stream", self.base_url);
        debug!(url = %url, session_id = %request.session_id, "opening completion stream");

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(ProviderStreamError::from)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderStreamError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let byte_stream = response.bytes_stream();

        struct StreamState<S> {
            bytes: S,
            parser: SseParser,
            line_buffer: String,
            pending: Vec<Result<ProviderEvent, ProviderStreamError>>,
            finished: bool,
        }

        let state = StreamState {
            bytes: byte_stream,
            parser: SseParser::new(),
            line_buffer: String::new(),
            pending: Vec::new(),
            finished: false,
        };

        let event_stream = stream::unfold(state, |mut state| async move {
            loop {
                // Drain events parsed from a previous chunk first.
                if !state.pending.is_empty() {
                    let item = state.pending.remove(0);
                    return Some((item, state));
                }
                if state.finished {
                    return None;
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = String::from_utf8_lossy(&chunk);
                        state.line_buffer.push_str(&text);

                        while let Some(newline_pos) = state.line_buffer.find('\n') {
                            let line: String =
                                state.line_buffer.drain(..=newline_pos).collect();
                            let line = line.trim_end_matches(['\n', '\r']);
                            match state.parser.feed_line(line) {
                                Ok(Some(SseEvent::Delta { text })) => {
                                    state.pending.push(Ok(ProviderEvent::Delta(text)));
                                }
                                Ok(Some(SseEvent::Done)) => {
                                    state.pending.push(Ok(ProviderEvent::Done));
                                    state.finished = true;
                                }
                                Ok(Some(SseEvent::Error { message, code })) => {
                                    state.pending.push(Err(ProviderStreamError::Provider {
                                        code,
                                        message,
                                    }));
                                    state.finished = true;
                                }
                                Ok(Some(SseEvent::Ping)) | Ok(None) => {}
                                Err(err) => {
                                    state.pending.push(Err(err.into()));
                                    state.finished = true;
                                }
                            }
                        }
                    }
                    Some(Err(err)) => {
                        state.pending.push(Err(ProviderStreamError::from(err)));
                        state.finished = true;
                    }
                    None => {
                        // Transport closed. Flush any final unterminated line
                        // and the event it may complete.
                        state.finished = true;
                        if !state.line_buffer.is_empty() {
                            let line = std::mem::take(&mut state.line_buffer);
                            let line = line.trim_end_matches('\r');
                            match state.parser.feed_line(line) {
                                Ok(Some(SseEvent::Delta { text })) => {
                                    state.pending.push(Ok(ProviderEvent::Delta(text)));
                                }
                                Ok(Some(SseEvent::Done)) => {
                                    state.pending.push(Ok(ProviderEvent::Done));
                                }
                                Ok(Some(SseEvent::Error { message, code })) => {
                                    state.pending.push(Err(ProviderStreamError::Provider {
                                        code,
                                        message,
                                    }));
                                }
                                Ok(Some(SseEvent::Ping)) | Ok(None) => {}
                                Err(err) => state.pending.push(Err(err.into())),
                            }
                        }
                        match state.parser.feed_line("") {
                            Ok(Some(SseEvent::Delta { text })) => {
                                state.pending.push(Ok(ProviderEvent::Delta(text)));
                            }
                            Ok(Some(SseEvent::Done)) => {
                                state.pending.push(Ok(ProviderEvent::Done));
                            }
                            Ok(Some(SseEvent::Error { message, code })) => {
                                state
                                    .pending
                                    .push(Err(ProviderStreamError::Provider { code, message }));
                            }
                            Ok(Some(SseEvent::Ping)) | Ok(None) => {}
                            Err(err) => state.pending.push(Err(err.into())),
                        }
                    }
                }
            }
        });

        Ok(Box::pin(event_stream))
    }

    async fn cancel(&self, session_id: &str) -> Result<(), ProviderStreamError> {
        let url = format!("{}/v1/cancel", self.base_url);
        debug!(session_id = %session_id, "cancelling completion session");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "session_id": session_id }))
            .send()
            .await
            .map_err(ProviderStreamError::from)?;

        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                "cancel request rejected by backend"
            );
            return Err(ProviderStreamError::HttpStatus {
                status: response.status().as_u16(),
                message: "cancel rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        assert_eq!(DEFAULT_BASE_URL, "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_stream_completion_connection_refused() {
        // Port 1 on loopback refuses immediately.
        let client = SseProviderClient::new("http://127.0.0.1:1");
        let request = CompletionRequest::new("hello", "m");
        let result = client.stream_completion(&request).await;
        assert!(matches!(
            result,
            Err(ProviderStreamError::ConnectionFailed { .. })
                | Err(ProviderStreamError::Interrupted { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_connection_refused() {
        let client = SseProviderClient::new("http://127.0.0.1:1");
        let result = client.cancel("session-1").await;
        assert!(result.is_err());
    }
}
