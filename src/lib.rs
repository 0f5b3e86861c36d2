//! Scenechat - streaming chat core for AI-generated 3D/WebXR scenes
//!
//! This crate implements the platform-independent half of a scene-generation
//! chat client: conversation threading, streaming response accumulation,
//! code-fence extraction, and turn orchestration. UI rendering and the actual
//! 3D runtime are external collaborators reached through the traits in
//! [`traits`].

pub mod accumulator;
pub mod adapters;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod orchestrator;
pub mod sse;
pub mod traits;
