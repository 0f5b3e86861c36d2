//! Turn orchestration.
//!
//! [`TurnOrchestrator`] drives one chat turn end to end: validate the input,
//! thread and persist the user message, stream the completion, accumulate
//! deltas, and persist the assistant reply. Provider failures are not
//! surfaced as errors from [`TurnOrchestrator::submit_user_message`]; they
//! become a persisted assistant message so the conversation itself records
//! what happened. Store failures do propagate.
//!
//! One turn may be in flight per conversation at a time. A second submission
//! while a turn streams is rejected with [`TurnError::TurnInProgress`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

use crate::accumulator::StreamAccumulator;
use crate::error::{ChatError, ProviderStreamError, TurnError};
use crate::extract::extract_code;
use crate::models::{default_library, library_by_id, CompletionRequest, Conversation, Message};
use crate::traits::{CompletionProvider, ConversationStore, ProviderEvent};

/// Progress notification for an in-flight turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnUpdate {
    /// A delta arrived and was accumulated.
    Delta {
        conversation_id: String,
        text: String,
    },
    /// The assistant message was persisted.
    Completed {
        conversation_id: String,
        message_id: String,
    },
    /// The turn was cancelled; no assistant message was kept.
    Cancelled { conversation_id: String },
    /// The provider failed; the message is what was persisted in place of a
    /// response.
    Failed {
        conversation_id: String,
        message: String,
    },
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Id of the persisted assistant message, absent when cancelled.
    pub assistant_message_id: Option<String>,
    /// Scene code extracted from the final response text, if any.
    pub extracted_code: Option<String>,
    /// Whether the turn was cancelled before completion.
    pub cancelled: bool,
}

/// Per-turn cancellation signal. The notify wakes a turn parked on a stalled
/// stream so cancellation does not wait for the next provider event.
struct CancelSignal {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }
}

/// Drives chat turns against a completion provider and a conversation store.
pub struct TurnOrchestrator {
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn ConversationStore>,
    model: String,
    temperature: Option<f32>,
    top_p: Option<f32>,
    in_flight: Mutex<HashMap<String, Arc<CancelSignal>>>,
    update_tx: Option<mpsc::UnboundedSender<TurnUpdate>>,
}

/// Removes the conversation's in-flight entry on every exit path.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<String, Arc<CancelSignal>>>,
    conversation_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap()
            .remove(&self.conversation_id);
    }
}

impl TurnOrchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ConversationStore>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            model: model.into(),
            temperature: None,
            top_p: None,
            in_flight: Mutex::new(HashMap::new()),
            update_tx: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Attach a progress channel. Updates are best effort; a dropped
    /// receiver never fails a turn.
    pub fn with_update_channel(mut self) -> (Self, mpsc::UnboundedReceiver<TurnUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.update_tx = Some(tx);
        (self, rx)
    }

    fn send_update(&self, update: TurnUpdate) {
        if let Some(tx) = &self.update_tx {
            let _ = tx.send(update);
        }
    }

    /// Whether a turn is currently streaming for the conversation.
    pub fn is_streaming(&self, conversation_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap()
            .contains_key(conversation_id)
    }

    /// Request cancellation of the conversation's in-flight turn.
    ///
    /// Returns whether a turn was in flight. The partial response is
    /// discarded; no assistant message is persisted for a cancelled turn.
    pub fn cancel_turn(&self, conversation_id: &str) -> bool {
        match self.in_flight.lock().unwrap().get(conversation_id) {
            Some(signal) => {
                signal.flag.store(true, Ordering::SeqCst);
                signal.notify.notify_one();
                true
            }
            None => false,
        }
    }

    /// Run one full chat turn.
    ///
    /// `reply_parent_id` threads both the user message and the assistant
    /// reply under that parent; `None` makes them top-level.
    pub async fn submit_user_message(
        &self,
        conversation: &mut Conversation,
        text: &str,
        reply_parent_id: Option<&str>,
    ) -> Result<TurnOutcome, ChatError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TurnError::EmptyInput.into());
        }

        let cancel_signal = Arc::new(CancelSignal::new());
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if in_flight.contains_key(&conversation.id) {
                return Err(TurnError::TurnInProgress {
                    conversation_id: conversation.id.clone(),
                }
                .into());
            }
            in_flight.insert(conversation.id.clone(), cancel_signal.clone());
        }
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            conversation_id: conversation.id.clone(),
        };

        let library = conversation
            .library_id
            .as_deref()
            .and_then(library_by_id)
            .unwrap_or_else(default_library);

        let mut user_message = Message::user(trimmed).with_library(library.id);
        if let Some(parent_id) = reply_parent_id {
            user_message = user_message.with_parent(parent_id);
        }
        conversation.append_message(user_message)?;
        conversation.generate_title_if_needed();
        self.store.save(conversation).await?;

        let model = conversation
            .model_used
            .clone()
            .unwrap_or_else(|| self.model.clone());
        let mut request = CompletionRequest::new(trimmed, model)
            .with_system_prompt(library.system_prompt);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(top_p) = self.top_p {
            request = request.with_top_p(top_p);
        }

        debug!(
            conversation_id = %conversation.id,
            session_id = %request.session_id,
            library = library.id,
            "starting turn"
        );

        let mut events = match self.provider.stream_completion(&request).await {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, "provider rejected stream open");
                return self
                    .persist_failure(conversation, reply_parent_id, library.id, "", &err)
                    .await;
            }
        };

        let mut accumulator = StreamAccumulator::new();
        accumulator.start().map_err(ChatError::from)?;

        let mut failure: Option<ProviderStreamError> = None;
        loop {
            if cancel_signal.flag.load(Ordering::SeqCst) {
                debug!(conversation_id = %conversation.id, "turn cancelled");
                if let Err(err) = self.provider.cancel(&request.session_id).await {
                    warn!(error = %err, "backend cancel failed");
                }
                self.send_update(TurnUpdate::Cancelled {
                    conversation_id: conversation.id.clone(),
                });
                return Ok(TurnOutcome {
                    assistant_message_id: None,
                    extracted_code: None,
                    cancelled: true,
                });
            }

            // The notify wakes a turn whose stream has stalled; the flag
            // check at the loop top then takes the cancel path.
            tokio::select! {
                _ = cancel_signal.notify.notified() => {}
                item = events.next() => match item {
                    Some(Ok(ProviderEvent::Delta(text))) => {
                        accumulator.append(&text).map_err(ChatError::from)?;
                        self.send_update(TurnUpdate::Delta {
                            conversation_id: conversation.id.clone(),
                            text,
                        });
                    }
                    Some(Ok(ProviderEvent::Done)) | None => break,
                    Some(Err(err)) => {
                        failure = Some(err);
                        break;
                    }
                },
            }
        }

        let response_text = accumulator.finalize().map_err(ChatError::from)?;

        if let Some(err) = failure {
            warn!(error = %err, "provider stream failed mid-turn");
            return self
                .persist_failure(conversation, reply_parent_id, library.id, &response_text, &err)
                .await;
        }

        let mut assistant = Message::assistant(response_text.clone()).with_library(library.id);
        if let Some(parent_id) = reply_parent_id {
            assistant = assistant.with_parent(parent_id);
        }
        let assistant_id = assistant.id.clone();
        conversation.append_message(assistant)?;
        self.store.update(conversation).await?;

        let extracted_code = extract_code(&response_text);
        debug!(
            conversation_id = %conversation.id,
            message_id = %assistant_id,
            has_code = extracted_code.is_some(),
            "turn completed"
        );
        self.send_update(TurnUpdate::Completed {
            conversation_id: conversation.id.clone(),
            message_id: assistant_id.clone(),
        });

        Ok(TurnOutcome {
            assistant_message_id: Some(assistant_id),
            extracted_code,
            cancelled: false,
        })
    }

    /// Persist a provider failure as an assistant message.
    ///
    /// Partial text received before the failure is kept, followed by the
    /// human-readable explanation. No code is ever extracted from a failed
    /// turn.
    async fn persist_failure(
        &self,
        conversation: &mut Conversation,
        reply_parent_id: Option<&str>,
        library_id: &str,
        partial_text: &str,
        error: &ProviderStreamError,
    ) -> Result<TurnOutcome, ChatError> {
        let notice = error.user_message();
        let content = if partial_text.is_empty() {
            notice.clone()
        } else {
            format!("{}\n\n{}", partial_text, notice)
        };

        let mut assistant = Message::assistant(content).with_library(library_id);
        if let Some(parent_id) = reply_parent_id {
            assistant = assistant.with_parent(parent_id);
        }
        let assistant_id = assistant.id.clone();
        conversation.append_message(assistant)?;
        self.store.update(conversation).await?;

        self.send_update(TurnUpdate::Failed {
            conversation_id: conversation.id.clone(),
            message: notice,
        });

        Ok(TurnOutcome {
            assistant_message_id: Some(assistant_id),
            extracted_code: None,
            cancelled: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryStore, MockProvider};

    fn orchestrator(
        provider: Arc<MockProvider>,
        store: Arc<InMemoryStore>,
    ) -> TurnOrchestrator {
        TurnOrchestrator::new(provider, store, "scene-coder-v1")
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_side_effects() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(InMemoryStore::new());
        let orch = orchestrator(provider.clone(), store.clone());
        let mut conv = Conversation::new();

        let err = orch
            .submit_user_message(&mut conv, "   \n\t  ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Turn(TurnError::EmptyInput)));
        assert!(conv.messages.is_empty());
        assert!(provider.requests().is_empty());
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn test_parent_not_found_rejected_before_persistence() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(InMemoryStore::new());
        let orch = orchestrator(provider.clone(), store.clone());
        let mut conv = Conversation::new();

        let err = orch
            .submit_user_message(&mut conv, "reply", Some("no-such-msg"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Turn(TurnError::ParentNotFound { .. })
        ));
        assert!(conv.messages.is_empty());
        assert!(store.operations().is_empty());
        assert!(!orch.is_streaming(&conv.id));
    }

    #[tokio::test]
    async fn test_request_carries_library_system_prompt_and_model() {
        let provider = Arc::new(MockProvider::new());
        provider.enqueue_deltas(&["ok"]);
        let store = Arc::new(InMemoryStore::new());
        let orch = orchestrator(provider.clone(), store);
        let mut conv = Conversation::new().with_library("three").with_model("pinned-model");

        orch.submit_user_message(&mut conv, "make a cube", None)
            .await
            .unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "pinned-model");
        assert!(requests[0]
            .system_prompt
            .as_deref()
            .unwrap()
            .contains("Three.js"));
    }

    #[tokio::test]
    async fn test_default_model_used_when_not_pinned() {
        let provider = Arc::new(MockProvider::new());
        provider.enqueue_deltas(&["ok"]);
        let store = Arc::new(InMemoryStore::new());
        let orch = orchestrator(provider.clone(), store);
        let mut conv = Conversation::new();

        orch.submit_user_message(&mut conv, "hello", None)
            .await
            .unwrap();
        assert_eq!(provider.requests()[0].model, "scene-coder-v1");
    }

    #[tokio::test]
    async fn test_in_flight_entry_cleared_after_turn() {
        let provider = Arc::new(MockProvider::new());
        provider.enqueue_deltas(&["hi"]);
        let store = Arc::new(InMemoryStore::new());
        let orch = orchestrator(provider, store);
        let mut conv = Conversation::new();

        orch.submit_user_message(&mut conv, "hello", None)
            .await
            .unwrap();
        assert!(!orch.is_streaming(&conv.id));
        assert!(!orch.cancel_turn(&conv.id));
    }

    #[tokio::test]
    async fn test_store_save_failure_propagates() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(InMemoryStore::new());
        store.fail_next_save();
        let orch = orchestrator(provider.clone(), store);
        let mut conv = Conversation::new();

        let err = orch
            .submit_user_message(&mut conv, "hello", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Store(_)));
        // The provider was never contacted.
        assert!(provider.requests().is_empty());
    }
}
