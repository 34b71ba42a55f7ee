//! Persona configuration.
//!
//! A persona is the per-account prompt and template bundle driving both
//! generated and canned replies. It is loaded once at connect time and is
//! immutable for the lifetime of the session.

use chrono::{DateTime, Utc};
use copper_relay_core::{AccountId, PersonaId};
use serde::{Deserialize, Serialize};

/// An optional piece of background knowledge folded into the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Short label for the fact.
    pub topic: String,
    /// The fact itself.
    pub content: String,
}

/// Per-account persona configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier.
    pub id: PersonaId,
    /// The account this persona belongs to.
    pub account_id: AccountId,
    /// Base system prompt describing the character.
    pub base_prompt: String,
    /// Welcome message sent to first-time users; empty disables the welcome.
    pub welcome_message: String,
    /// Payment-instructions template, folded into the system prompt.
    pub payment_info_message: String,
    /// Optional knowledge entries.
    pub knowledge: Vec<KnowledgeEntry>,
    /// When the persona was created.
    pub created_at: DateTime<Utc>,
}

impl Persona {
    /// Creates a persona with the given prompts and no knowledge entries.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        base_prompt: impl Into<String>,
        welcome_message: impl Into<String>,
        payment_info_message: impl Into<String>,
    ) -> Self {
        Self {
            id: PersonaId::new(),
            account_id,
            base_prompt: base_prompt.into(),
            welcome_message: welcome_message.into(),
            payment_info_message: payment_info_message.into(),
            knowledge: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a knowledge entry.
    #[must_use]
    pub fn with_knowledge(
        mut self,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.knowledge.push(KnowledgeEntry {
            topic: topic.into(),
            content: content.into(),
        });
        self
    }

    /// Returns true if a welcome message is configured.
    #[must_use]
    pub fn has_welcome_message(&self) -> bool {
        !self.welcome_message.trim().is_empty()
    }
}
