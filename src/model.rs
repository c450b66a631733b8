//! Domain types shared across the store, queue, and transports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Client-side delivery status of an outbound message.
///
/// Only `Queued`, `Sending`, `Sent` and `Failed` are produced by the
/// outbox; `Delivered` exists for wire compatibility with servers that
/// report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Queued,
    Sending,
    Sent,
    Delivered,
    Failed,
}

/// An attachment carried inline as base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_name: String,
    pub file_data: String,
    pub file_mime_type: String,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub is_image: bool,
    #[serde(default)]
    pub is_document: bool,
    #[serde(default)]
    pub is_audio: bool,
}

/// A recorded voice message attached to an outbound send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceRecording {
    /// Base64-encoded audio payload.
    pub audio_data: String,
    pub audio_file_name: String,
    pub audio_mime_type: String,
    /// Duration in seconds.
    pub duration: f64,
}

/// A single chat message, user- or assistant-authored.
///
/// Outbound messages are created optimistically with a `temp-` id and a
/// client-only [`MessageStatus`]; the assistant's reply arrives with a
/// server-issued id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    pub id: String,
    pub chat_id: String,
    pub sender: Sender,
    pub text: String,
    pub sent_date: DateTime<Utc>,
    #[serde(default)]
    pub has_attachment: bool,
    #[serde(default)]
    pub files: Vec<FileInfo>,
    #[serde(default)]
    pub is_audio: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_code: Option<String>,
    #[serde(default)]
    pub is_code: bool,
    #[serde(default)]
    pub is_article: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_text: Option<String>,
    #[serde(default)]
    pub is_multi_response: bool,
    #[serde(default)]
    pub is_mixed_attachments: bool,
    /// Delivery status. Client-only; never sent to the server.
    #[serde(skip)]
    pub status: Option<MessageStatus>,
}

impl ChatHistory {
    /// Build an optimistic user message with a fresh `temp-` id.
    #[must_use]
    pub fn optimistic(
        chat_id: impl Into<String>,
        text: impl Into<String>,
        files: Vec<FileInfo>,
        voice: Option<&VoiceRecording>,
        status: MessageStatus,
    ) -> Self {
        let text = text.into();
        let text = if text.is_empty() && !files.is_empty() {
            format!("[{} file(s) attached]", files.len())
        } else {
            text
        };
        Self {
            id: format!("temp-{}", uuid::Uuid::new_v4()),
            chat_id: chat_id.into(),
            sender: Sender::User,
            text,
            sent_date: Utc::now(),
            has_attachment: !files.is_empty(),
            files,
            is_audio: voice.is_some(),
            audio_data: voice.map(|v| v.audio_data.clone()),
            audio_file_name: voice.map(|v| v.audio_file_name.clone()),
            audio_mime_type: voice.map(|v| v.audio_mime_type.clone()),
            duration: voice.map(|v| v.duration),
            artifact_code: None,
            is_code: false,
            is_article: false,
            article_text: None,
            is_multi_response: false,
            is_mixed_attachments: false,
            status: Some(status),
        }
    }

    /// Build a synthetic assistant message carrying error text, so the
    /// conversation always has a renderable entry even on failure.
    #[must_use]
    pub fn assistant_error(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut msg = Self::assistant_text(chat_id, text);
        msg.id = format!("err-{}", uuid::Uuid::new_v4());
        msg
    }

    /// Build a client-synthesized assistant message from plain text
    /// (e.g. a non-JSON webhook reply body).
    #[must_use]
    pub fn assistant_text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: format!("server-{}", uuid::Uuid::new_v4()),
            chat_id: chat_id.into(),
            sender: Sender::Assistant,
            text: text.into(),
            sent_date: Utc::now(),
            has_attachment: false,
            files: Vec::new(),
            is_audio: false,
            audio_data: None,
            audio_file_name: None,
            audio_mime_type: None,
            duration: None,
            artifact_code: None,
            is_code: false,
            is_article: false,
            article_text: None,
            is_multi_response: false,
            is_mixed_attachments: false,
            status: None,
        }
    }
}

/// A conversation with one assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub assistant_id: String,
    pub title: String,
    #[serde(default)]
    pub unread: u32,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_date: Option<DateTime<Utc>>,
}

/// A configured chat persona with its own webhook backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub avatar_url: String,
    pub webhook_url: String,
    #[serde(default)]
    pub s2s_token: String,
    pub code: String,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_order: Option<u32>,
}
