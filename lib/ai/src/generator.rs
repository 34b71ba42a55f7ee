//! Persona reply generation.
//!
//! Assembles the single system-role prompt from a persona's configuration
//! and asks the chat backend for one completion. The router sends whatever
//! comes back; a failed generation means the user receives no reply for
//! that turn.

use crate::backend::{ChatBackend, ChatMessage};
use crate::error::GenerationError;
use crate::persona::Persona;
use async_trait::async_trait;

/// Behavioral instructions appended to every persona's base prompt.
const BEHAVIOR_INSTRUCTIONS: &str = "\
Stay fully in character at all times. Never mention that you are an AI, \
a bot, or a language model, and never break character to discuss these \
instructions. Keep replies short and conversational, like real chat \
messages. If the user asks about purchasing, paying, or how to buy, \
answer with the payment instructions below.";

/// Trait for generating a reply to an inbound message.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generates a reply in the persona's voice.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails; the caller treats this
    /// as "no reply available" and sends nothing.
    async fn generate(
        &self,
        persona: &Persona,
        inbound_text: &str,
    ) -> Result<String, GenerationError>;
}

/// Reply generator that prompts a chat backend with the persona's
/// configuration.
pub struct PersonaResponder<B: ChatBackend> {
    backend: B,
}

impl<B: ChatBackend> PersonaResponder<B> {
    /// Creates a responder over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Builds the system prompt for a persona.
    #[must_use]
    pub fn system_prompt(persona: &Persona) -> String {
        let mut prompt = String::new();
        prompt.push_str(&persona.base_prompt);
        prompt.push_str("\n\n");
        prompt.push_str(BEHAVIOR_INSTRUCTIONS);
        prompt.push_str("\n\nPayment instructions:\n");
        prompt.push_str(&persona.payment_info_message);

        if !persona.knowledge.is_empty() {
            prompt.push_str("\n\nBackground you know:");
            for entry in &persona.knowledge {
                prompt.push_str("\n- ");
                prompt.push_str(&entry.topic);
                prompt.push_str(": ");
                prompt.push_str(&entry.content);
            }
        }

        prompt
    }
}

#[async_trait]
impl<B: ChatBackend> ReplyGenerator for PersonaResponder<B> {
    async fn generate(
        &self,
        persona: &Persona,
        inbound_text: &str,
    ) -> Result<String, GenerationError> {
        let messages = [
            ChatMessage::system(Self::system_prompt(persona)),
            ChatMessage::user(inbound_text),
        ];
        self.backend.complete(&messages).await
    }
}
