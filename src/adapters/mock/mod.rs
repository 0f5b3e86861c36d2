//! Mock adapters for tests.

mod provider;
mod store;

pub use provider::MockProvider;
pub use store::InMemoryStore;
