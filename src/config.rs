//! Configuration types for the chat client.
//!
//! Assistants and their webhook endpoints are configured here rather
//! than hardcoded per assistant in source.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClientError, Result};

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The signed-in user.
    pub user: UserConfig,
    /// Chat/assistant CRUD backend settings.
    pub api: BackendConfig,
    /// Webhook delivery settings.
    pub webhook: WebhookConfig,
    /// Voice-agent event stream settings.
    pub voice: VoiceConfig,
    /// Configured assistants.
    pub assistants: Vec<AssistantProfile>,
}

/// User identity configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Backend user id appended to webhook and API paths.
    pub id: String,
}

/// Backend REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the chat CRUD backend.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Webhook transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Per-request timeout in seconds. Webhook flows can run long
    /// server-side (transcription, multi-step automations).
    pub request_timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
        }
    }
}

/// Voice-agent event stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// API key sent on the WebSocket upgrade request.
    pub api_key: String,
    /// Endpoint base; the conversation id is appended per connection.
    pub endpoint: String,
    /// Reconnect attempts before giving up on an abnormal closure.
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential reconnect backoff, in milliseconds.
    pub reconnect_base_delay_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "wss://api.elevenlabs.io/v1/convai/conversation".to_owned(),
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1000,
        }
    }
}

/// A configured assistant endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantProfile {
    /// Stable short code (e.g. `ava`, `erica`).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional subtitle shown under the name.
    pub subtitle: String,
    /// n8n webhook endpoint for this assistant.
    pub webhook_url: String,
    /// Speech-to-speech agent token, if the assistant supports voice mode.
    pub s2s_token: String,
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| ClientError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `BGOS_CONFIG`, then the platform config dir, then defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("BGOS_CONFIG") {
            return Self::from_file(path);
        }
        let default = Self::default_path();
        if default.exists() {
            return Self::from_file(default);
        }
        Ok(Self::default())
    }

    /// Platform-appropriate default config path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bgos")
            .join("config.toml")
    }

    /// Look up an assistant by its short code.
    #[must_use]
    pub fn assistant(&self, code: &str) -> Option<&AssistantProfile> {
        self.assistants.iter().find(|a| a.code == code)
    }

    fn validate(&self) -> Result<()> {
        for assistant in &self.assistants {
            if assistant.code.trim().is_empty() {
                return Err(ClientError::Config(
                    "assistant is missing a code".to_owned(),
                ));
            }
        }
        let mut codes: Vec<&str> = self.assistants.iter().map(|a| a.code.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        if codes.len() != self.assistants.len() {
            return Err(ClientError::Config(
                "assistant codes must be unique".to_owned(),
            ));
        }
        if self.webhook.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "webhook.request_timeout_secs must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}
