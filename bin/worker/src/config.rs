//! Centralized worker configuration.
//!
//! This module provides strongly-typed configuration for the worker,
//! loaded via the `config` crate from environment variables
//! (`STORE__URL`, `STORE__SERVICE_KEY`, `GENERATION__API_KEY`, plus
//! optional overrides). Startup aborts when a required value is absent.

use copper_relay_ai::GenerationParams;
use serde::Deserialize;

/// Worker configuration composed from per-concern sections.
#[derive(Debug, Deserialize)]
pub struct WorkerConfig {
    /// External store connection and change-feed settings.
    pub store: StoreConfig,

    /// Text-generation endpoint settings.
    pub generation: GenerationConfig,

    /// Messaging-network settings.
    #[serde(default)]
    pub messenger: MessengerConfig,
}

/// Store-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Postgres connection URL.
    pub url: String,

    /// Service credential applied to the connection.
    pub service_key: String,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Notification channel carrying account change events.
    #[serde(default = "default_change_channel")]
    pub change_channel: String,
}

/// Generation-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Bearer token for the generation endpoint.
    pub api_key: String,

    /// Endpoint base URL.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Fixed model identifier.
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Fixed max-tokens parameter.
    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: u32,

    /// Fixed sampling temperature.
    #[serde(default = "default_generation_temperature")]
    pub temperature: f32,
}

impl GenerationConfig {
    /// Returns the fixed sampling parameters for the backend.
    #[must_use]
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Messenger-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MessengerConfig {
    /// Session-open retry count.
    #[serde(default = "default_connection_retries")]
    pub connection_retries: u32,
}

fn default_max_connections() -> u32 {
    5
}

fn default_change_channel() -> String {
    "telegram_accounts_changes".to_string()
}

fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_generation_max_tokens() -> u32 {
    300
}

fn default_generation_temperature() -> f32 {
    0.8
}

fn default_connection_retries() -> u32 {
    3
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            connection_retries: default_connection_retries(),
        }
    }
}

impl WorkerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
