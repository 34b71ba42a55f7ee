//! Chat-completion backend abstraction.
//!
//! Provides the seam between the reply generator and whichever
//! chat-completion endpoint serves it.

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

/// A single message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: ChatRole,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Fixed sampling parameters for every generation call.
///
/// The worker uses one model with one parameter set; nothing varies
/// per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model identifier sent to the endpoint.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generates one completion for the given messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the endpoint reports a
    /// non-success status, or the response is malformed.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GenerationError>;

    /// Returns the model identifier this backend generates with.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let system = ChatMessage::system("be brief");
        assert_eq!(system.role, ChatRole::System);

        let user = ChatMessage::user("hello");
        assert_eq!(user.role, ChatRole::User);

        let assistant = ChatMessage::assistant("hi!");
        assert_eq!(assistant.role, ChatRole::Assistant);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("x")).expect("serialize");
        assert!(json.contains(r#""role":"user""#));
    }

    #[test]
    fn params_serde_roundtrip() {
        let params = GenerationParams {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 300,
            temperature: 0.8,
        };
        let json = serde_json::to_string(&params).expect("serialize");
        let parsed: GenerationParams = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(params, parsed);
    }
}
