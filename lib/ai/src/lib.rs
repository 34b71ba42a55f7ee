//! Persona reply generation for the copper-relay worker.
//!
//! This crate provides:
//!
//! - **Persona**: the per-account prompt and template configuration
//! - **ChatBackend**: the chat-completion seam, with the
//!   OpenAI-compatible HTTP implementation
//! - **ReplyGenerator**: system-prompt assembly and the single-shot
//!   generation call the router uses for regular messages

pub mod backend;
pub mod error;
pub mod generator;
pub mod openai;
pub mod persona;

pub use backend::{ChatBackend, ChatMessage, ChatRole, GenerationParams};
pub use error::GenerationError;
pub use generator::{PersonaResponder, ReplyGenerator};
pub use openai::OpenAiCompatBackend;
pub use persona::{KnowledgeEntry, Persona};
