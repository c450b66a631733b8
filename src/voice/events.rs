//! Typed events on the voice-agent WebSocket.
//!
//! Frames are JSON objects tagged by `type`. Unknown tags are kept (as
//! [`VoiceEvent::Unknown`]) rather than treated as errors, since the
//! upstream service adds event types over time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable error codes carried by [`VoiceEvent::Error`].
pub mod error_codes {
    /// The WebSocket could not be created or upgraded.
    pub const CONNECTION_FAILED: &str = "CONNECTION_FAILED";
    /// A frame was not parseable JSON.
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    /// The socket reported a protocol/transport error.
    pub const WEBSOCKET_ERROR: &str = "WEBSOCKET_ERROR";
    /// Reconnection gave up after the configured number of attempts.
    pub const MAX_RECONNECT_ATTEMPTS: &str = "MAX_RECONNECT_ATTEMPTS";
}

/// One event frame from the voice-agent conversation stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceEvent {
    /// The agent started a tool invocation.
    ToolCalled {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        tool_input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    /// A tool invocation finished.
    ToolCompleted {
        tool_call_id: String,
        #[serde(default)]
        tool_output: Value,
    },
    /// A tool invocation failed.
    ToolError {
        tool_call_id: String,
        #[serde(default)]
        error: String,
    },
    /// Live transcription of the user's speech.
    #[serde(alias = "transcription")]
    UserTranscript {
        #[serde(default)]
        text: String,
        #[serde(default)]
        is_final: bool,
    },
    /// The agent's full response text.
    AgentResponse {
        #[serde(default)]
        text: String,
    },
    /// A streamed fragment of the agent's response.
    AgentResponsePart {
        #[serde(default)]
        text: String,
        #[serde(default)]
        is_final: bool,
    },
    /// Keepalive.
    Ping,
    /// Stream or connection error (also synthesized client-side).
    Error {
        #[serde(default)]
        message: String,
        #[serde(default)]
        code: String,
    },
    /// An event type this client does not know yet.
    #[serde(other)]
    Unknown,
}

impl VoiceEvent {
    /// Build a client-side error event.
    #[must_use]
    pub fn error(message: impl Into<String>, code: &str) -> Self {
        Self::Error {
            message: message.into(),
            code: code.to_owned(),
        }
    }

    /// The registry key listeners subscribe under.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ToolCalled { .. } => EventKind::ToolCalled,
            Self::ToolCompleted { .. } => EventKind::ToolCompleted,
            Self::ToolError { .. } => EventKind::ToolError,
            Self::UserTranscript { .. } => EventKind::UserTranscript,
            Self::AgentResponse { .. } => EventKind::AgentResponse,
            Self::AgentResponsePart { .. } => EventKind::AgentResponsePart,
            Self::Ping => EventKind::Ping,
            Self::Error { .. } => EventKind::Error,
            Self::Unknown => EventKind::Unknown,
        }
    }
}

/// Event categories for listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ToolCalled,
    ToolCompleted,
    ToolError,
    UserTranscript,
    AgentResponse,
    AgentResponsePart,
    Ping,
    Error,
    Unknown,
}
