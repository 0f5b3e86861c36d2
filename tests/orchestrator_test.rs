//! End-to-end turn orchestration tests against the mock provider and store.

mod common;

use std::sync::Arc;

use scenechat::adapters::mock::{InMemoryStore, MockProvider};
use scenechat::error::{ChatError, ProviderStreamError, TurnError};
use scenechat::models::Conversation;
use scenechat::orchestrator::{TurnOrchestrator, TurnUpdate};
use scenechat::traits::{ConversationStore, ProviderEvent};

use common::mock_setup;

#[tokio::test]
async fn test_happy_path_streams_persists_and_extracts_code() {
    let (provider, store, orchestrator) = mock_setup();
    provider.enqueue_deltas(&[
        "Here is your red cube:\n```javascript\n",
        "const x = 1;",
        "\n```\n[RUN_SCENE]",
    ]);

    let mut conv = Conversation::new();
    let outcome = orchestrator
        .submit_user_message(&mut conv, "Make a red cube", None)
        .await
        .unwrap();

    assert!(!outcome.cancelled);
    assert_eq!(outcome.extracted_code.as_deref(), Some("const x = 1;"));
    let assistant_id = outcome.assistant_message_id.unwrap();

    // Two top-level messages: the user prompt and the assistant reply.
    let top_level = conv.top_level_messages();
    assert_eq!(top_level.len(), 2);
    assert!(top_level[0].is_user);
    assert!(!top_level[1].is_user);
    assert_eq!(top_level[1].id, assistant_id);
    assert!(top_level[1].content.contains("const x = 1;"));

    // Title came from the prompt, and the persisted copy matches memory.
    assert_eq!(conv.title, "Make a red cube");
    let persisted = store.load(&conv.id).await.unwrap();
    assert_eq!(persisted, conv);
}

#[tokio::test]
async fn test_delta_and_completed_updates_emitted_in_order() {
    let provider = Arc::new(MockProvider::new());
    provider.enqueue_deltas(&["one", "two"]);
    let store = Arc::new(InMemoryStore::new());
    let (orchestrator, mut updates) =
        TurnOrchestrator::new(provider, store, common::TEST_MODEL).with_update_channel();

    let mut conv = Conversation::new();
    let outcome = orchestrator
        .submit_user_message(&mut conv, "hello", None)
        .await
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(update) = updates.try_recv() {
        seen.push(update);
    }
    assert_eq!(
        seen,
        vec![
            TurnUpdate::Delta {
                conversation_id: conv.id.clone(),
                text: "one".to_string(),
            },
            TurnUpdate::Delta {
                conversation_id: conv.id.clone(),
                text: "two".to_string(),
            },
            TurnUpdate::Completed {
                conversation_id: conv.id.clone(),
                message_id: outcome.assistant_message_id.unwrap(),
            },
        ]
    );
}

#[tokio::test]
async fn test_reply_threads_assistant_under_same_parent() {
    let (provider, _store, orchestrator) = mock_setup();
    provider.enqueue_deltas(&["first answer"]);
    provider.enqueue_deltas(&["threaded answer"]);

    let mut conv = Conversation::new();
    orchestrator
        .submit_user_message(&mut conv, "Make a cube", None)
        .await
        .unwrap();
    let parent_id = conv.messages[0].id.clone();

    let outcome = orchestrator
        .submit_user_message(&mut conv, "Make it red instead", Some(&parent_id))
        .await
        .unwrap();

    // Thread holds the reply prompt and its answer; top level is unchanged.
    let replies = conv.replies(&parent_id);
    assert_eq!(replies.len(), 2);
    assert!(replies[0].is_user);
    assert_eq!(replies[0].content, "Make it red instead");
    assert_eq!(replies[1].id, outcome.assistant_message_id.unwrap());
    assert_eq!(
        replies[1].thread_parent_id.as_deref(),
        Some(parent_id.as_str())
    );
    assert_eq!(conv.top_level_messages().len(), 2);
}

#[tokio::test]
async fn test_cancellation_discards_partial_response() {
    let provider = Arc::new(MockProvider::new());
    let tx = provider.enqueue_channel();
    let store = Arc::new(InMemoryStore::new());
    let (orchestrator, mut updates) =
        TurnOrchestrator::new(provider.clone(), store.clone(), common::TEST_MODEL)
            .with_update_channel();
    let orchestrator = Arc::new(orchestrator);

    let mut conv = Conversation::new();
    let conv_id = conv.id.clone();

    let orch = orchestrator.clone();
    let turn = tokio::spawn(async move {
        let outcome = orch
            .submit_user_message(&mut conv, "Make a cube", None)
            .await
            .unwrap();
        (outcome, conv)
    });

    // Let one delta through, then cancel while the stream is idle.
    tx.send(Ok(ProviderEvent::Delta("partial ".to_string())))
        .unwrap();
    loop {
        match updates.recv().await.unwrap() {
            TurnUpdate::Delta { .. } => break,
            other => panic!("unexpected update before delta: {:?}", other),
        }
    }
    assert!(orchestrator.cancel_turn(&conv_id));
    tx.send(Ok(ProviderEvent::Delta("never shown".to_string())))
        .unwrap();

    let (outcome, conv) = turn.await.unwrap();
    assert!(outcome.cancelled);
    assert!(outcome.assistant_message_id.is_none());
    assert!(outcome.extracted_code.is_none());

    // Only the user message survives, in memory and in the store.
    assert_eq!(conv.messages.len(), 1);
    assert!(conv.messages[0].is_user);
    let persisted = store.load(&conv_id).await.unwrap();
    assert_eq!(persisted.messages.len(), 1);

    // The backend was told to stop generating.
    let session_id = provider.requests()[0].session_id.clone();
    assert_eq!(provider.cancelled(), vec![session_id]);
}

#[tokio::test]
async fn test_cancellation_wakes_stalled_stream() {
    let provider = Arc::new(MockProvider::new());
    let tx = provider.enqueue_channel();
    let store = Arc::new(InMemoryStore::new());
    let (orchestrator, mut updates) =
        TurnOrchestrator::new(provider.clone(), store, common::TEST_MODEL)
            .with_update_channel();
    let orchestrator = Arc::new(orchestrator);

    let mut conv = Conversation::new();
    let conv_id = conv.id.clone();

    let orch = orchestrator.clone();
    let turn = tokio::spawn(async move {
        let outcome = orch
            .submit_user_message(&mut conv, "Make a cube", None)
            .await
            .unwrap();
        (outcome, conv)
    });

    tx.send(Ok(ProviderEvent::Delta("partial ".to_string())))
        .unwrap();
    loop {
        if let TurnUpdate::Delta { .. } = updates.recv().await.unwrap() {
            break;
        }
    }

    // No further provider events arrive; the turn must still notice the
    // cancellation while parked on the stream.
    assert!(orchestrator.cancel_turn(&conv_id));
    let (outcome, conv) = turn.await.unwrap();
    drop(tx);

    assert!(outcome.cancelled);
    assert!(outcome.assistant_message_id.is_none());
    assert_eq!(conv.messages.len(), 1);
    let session_id = provider.requests()[0].session_id.clone();
    assert_eq!(provider.cancelled(), vec![session_id]);
}

#[tokio::test]
async fn test_second_submission_rejected_while_streaming() {
    let provider = Arc::new(MockProvider::new());
    let tx = provider.enqueue_channel();
    let store = Arc::new(InMemoryStore::new());
    let (orchestrator, mut updates) =
        TurnOrchestrator::new(provider, store, common::TEST_MODEL).with_update_channel();
    let orchestrator = Arc::new(orchestrator);

    let mut conv = Conversation::new();
    let mut conv_handle = conv.clone();

    let orch = orchestrator.clone();
    let turn = tokio::spawn(async move {
        orch.submit_user_message(&mut conv, "first", None)
            .await
            .unwrap();
        conv
    });

    tx.send(Ok(ProviderEvent::Delta("streaming".to_string())))
        .unwrap();
    loop {
        if let TurnUpdate::Delta { .. } = updates.recv().await.unwrap() {
            break;
        }
    }

    let err = orchestrator
        .submit_user_message(&mut conv_handle, "second", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChatError::Turn(TurnError::TurnInProgress { .. })
    ));
    // The rejected submission left no trace.
    assert!(conv_handle.messages.is_empty());

    tx.send(Ok(ProviderEvent::Done)).unwrap();
    let conv = turn.await.unwrap();
    assert_eq!(conv.messages.len(), 2);

    // The slot frees up once the turn finishes.
    assert!(!orchestrator.is_streaming(&conv.id));
}

#[tokio::test]
async fn test_mid_stream_provider_error_becomes_assistant_message() {
    let (provider, store, orchestrator) = mock_setup();
    provider.enqueue_stream(vec![
        Ok(ProviderEvent::Delta("I was going to".to_string())),
        Err(ProviderStreamError::Provider {
            code: Some("overloaded".to_string()),
            message: "model overloaded".to_string(),
        }),
    ]);

    let mut conv = Conversation::new();
    let outcome = orchestrator
        .submit_user_message(&mut conv, "Make a cube", None)
        .await
        .unwrap();

    assert!(!outcome.cancelled);
    assert!(outcome.extracted_code.is_none());
    let assistant = conv
        .message(&outcome.assistant_message_id.unwrap())
        .unwrap();
    assert!(!assistant.is_user);
    // Partial text is kept, followed by a human-readable notice.
    assert!(assistant.content.starts_with("I was going to"));
    assert!(assistant.content.contains("model overloaded"));

    let persisted = store.load(&conv.id).await.unwrap();
    assert_eq!(persisted.messages.len(), 2);
}

#[tokio::test]
async fn test_open_failure_becomes_assistant_message() {
    let (provider, store, orchestrator) = mock_setup();
    provider.enqueue_open_error(ProviderStreamError::ConnectionFailed {
        message: "connection refused".to_string(),
    });

    let mut conv = Conversation::new();
    let outcome = orchestrator
        .submit_user_message(&mut conv, "Make a cube", None)
        .await
        .unwrap();

    let assistant = conv
        .message(&outcome.assistant_message_id.unwrap())
        .unwrap();
    assert!(assistant.content.contains("Could not reach the AI service"));
    assert_eq!(store.load(&conv.id).await.unwrap().messages.len(), 2);
}

#[tokio::test]
async fn test_empty_input_leaves_no_trace() {
    let (provider, store, orchestrator) = mock_setup();

    let mut conv = Conversation::new();
    let err = orchestrator
        .submit_user_message(&mut conv, "   ", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Turn(TurnError::EmptyInput)));
    assert!(conv.messages.is_empty());
    assert!(provider.requests().is_empty());
    assert!(store.operations().is_empty());
}

#[tokio::test]
async fn test_reply_to_unknown_parent_rejected() {
    let (provider, store, orchestrator) = mock_setup();

    let mut conv = Conversation::new();
    let err = orchestrator
        .submit_user_message(&mut conv, "reply", Some("ghost-id"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ChatError::Turn(TurnError::ParentNotFound { .. })
    ));
    assert!(conv.messages.is_empty());
    assert!(provider.requests().is_empty());
    assert!(store.operations().is_empty());
}

#[tokio::test]
async fn test_messages_tagged_with_conversation_library() {
    let (provider, _store, orchestrator) = mock_setup();
    provider.enqueue_deltas(&["<a-scene></a-scene>"]);

    let mut conv = Conversation::new().with_library("aframe");
    orchestrator
        .submit_user_message(&mut conv, "Make a sky", None)
        .await
        .unwrap();

    assert!(conv
        .messages
        .iter()
        .all(|m| m.library_id.as_deref() == Some("aframe")));
    assert!(provider.requests()[0]
        .system_prompt
        .as_deref()
        .unwrap()
        .contains("A-Frame"));
}
