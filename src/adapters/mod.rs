//! Concrete adapter implementations of the trait seams.

mod json_store;
pub mod mock;
mod sse_provider;

pub use json_store::JsonFileStore;
pub use sse_provider::{SseProviderClient, DEFAULT_BASE_URL};
