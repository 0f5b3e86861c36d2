//! Shared helpers for integration tests.

use std::sync::Arc;

use scenechat::adapters::mock::{InMemoryStore, MockProvider};
use scenechat::orchestrator::TurnOrchestrator;

pub const TEST_MODEL: &str = "scene-coder-v1";

/// Build an orchestrator wired to fresh mocks.
pub fn mock_setup() -> (Arc<MockProvider>, Arc<InMemoryStore>, TurnOrchestrator) {
    let provider = Arc::new(MockProvider::new());
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = TurnOrchestrator::new(provider.clone(), store.clone(), TEST_MODEL);
    (provider, store, orchestrator)
}
