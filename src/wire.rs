//! Wire mapping between server JSON and domain types.
//!
//! Every ingress path (webhook replies, chat CRUD, assistant lists,
//! unread counts) goes through this module. Server payloads are
//! snake_case canonically, but some deployments emit camelCase for the
//! same fields, so each DTO accepts both via serde aliases. Domain types
//! never carry wire quirks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Assistant, Chat, ChatHistory, FileInfo, Sender};

/// Accept a JSON string or number as a `String` (ids arrive as both).
fn de_stringy<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn de_stringy_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Accept a JSON number or numeric string as a count.
fn de_countish<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => Ok(n.as_u64().unwrap_or(0) as u32),
        Some(Value::String(s)) => Ok(s.trim().parse().unwrap_or(0)),
        Some(_) => Ok(0),
    }
}

fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Chat history
// ---------------------------------------------------------------------------

/// Wire form of an attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDoc {
    #[serde(alias = "fileName")]
    pub file_name: String,
    #[serde(alias = "fileData")]
    pub file_data: String,
    #[serde(alias = "fileMimeType")]
    pub file_mime_type: String,
    #[serde(alias = "isVideo")]
    pub is_video: bool,
    #[serde(alias = "isImage")]
    pub is_image: bool,
    #[serde(alias = "isDocument")]
    pub is_document: bool,
    #[serde(alias = "isAudio")]
    pub is_audio: bool,
}

impl From<FileDoc> for FileInfo {
    fn from(doc: FileDoc) -> Self {
        Self {
            file_name: doc.file_name,
            file_data: doc.file_data,
            file_mime_type: doc.file_mime_type,
            is_video: doc.is_video,
            is_image: doc.is_image,
            is_document: doc.is_document,
            is_audio: doc.is_audio,
        }
    }
}

impl From<&FileInfo> for FileDoc {
    fn from(file: &FileInfo) -> Self {
        Self {
            file_name: file.file_name.clone(),
            file_data: file.file_data.clone(),
            file_mime_type: file.file_mime_type.clone(),
            is_video: file.is_video,
            is_image: file.is_image,
            is_document: file.is_document,
            is_audio: file.is_audio,
        }
    }
}

/// Wire form of a chat message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatHistoryDoc {
    #[serde(deserialize_with = "de_stringy_opt", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "chatId", deserialize_with = "de_stringy_opt", skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<Sender>,
    #[serde(alias = "sentDate", skip_serializing_if = "Option::is_none")]
    pub sent_date: Option<String>,
    pub text: String,
    #[serde(alias = "hasAttachment")]
    pub has_attachment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(alias = "artifactCode", skip_serializing_if = "Option::is_none")]
    pub artifact_code: Option<String>,
    #[serde(alias = "isCode")]
    pub is_code: bool,
    #[serde(alias = "isArticle")]
    pub is_article: bool,
    #[serde(alias = "articleText", skip_serializing_if = "Option::is_none")]
    pub article_text: Option<String>,
    #[serde(alias = "isMultiResponse")]
    pub is_multi_response: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileDoc>,
    #[serde(alias = "isAudio")]
    pub is_audio: bool,
    #[serde(alias = "isMixedAttachments")]
    pub is_mixed_attachments: bool,
    #[serde(alias = "audioData", skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
    #[serde(alias = "audioFileName", skip_serializing_if = "Option::is_none")]
    pub audio_file_name: Option<String>,
    #[serde(alias = "audioMimeType", skip_serializing_if = "Option::is_none")]
    pub audio_mime_type: Option<String>,
}

impl ChatHistoryDoc {
    /// Convert to the domain type, filling server omissions:
    /// a missing id becomes `server-<uuid>`, an unparseable date becomes now.
    #[must_use]
    pub fn into_model(self) -> ChatHistory {
        ChatHistory {
            id: self
                .id
                .unwrap_or_else(|| format!("server-{}", uuid::Uuid::new_v4())),
            chat_id: self.chat_id.unwrap_or_default(),
            sender: self.sender.unwrap_or(Sender::Assistant),
            text: self.text,
            sent_date: parse_date(self.sent_date.as_deref()).unwrap_or_else(Utc::now),
            has_attachment: self.has_attachment,
            files: self.files.into_iter().map(FileInfo::from).collect(),
            is_audio: self.is_audio,
            audio_data: self.audio_data,
            audio_file_name: self.audio_file_name,
            audio_mime_type: self.audio_mime_type,
            duration: self.duration,
            artifact_code: self.artifact_code,
            is_code: self.is_code,
            is_article: self.is_article,
            article_text: self.article_text,
            is_multi_response: self.is_multi_response,
            is_mixed_attachments: self.is_mixed_attachments,
            status: None,
        }
    }
}

impl From<&ChatHistory> for ChatHistoryDoc {
    fn from(msg: &ChatHistory) -> Self {
        Self {
            id: Some(msg.id.clone()),
            chat_id: Some(msg.chat_id.clone()),
            sender: Some(msg.sender),
            sent_date: Some(msg.sent_date.to_rfc3339()),
            text: msg.text.clone(),
            has_attachment: msg.has_attachment,
            duration: msg.duration,
            artifact_code: msg.artifact_code.clone(),
            is_code: msg.is_code,
            is_article: msg.is_article,
            article_text: msg.article_text.clone(),
            is_multi_response: msg.is_multi_response,
            files: msg.files.iter().map(FileDoc::from).collect(),
            is_audio: msg.is_audio,
            is_mixed_attachments: msg.is_mixed_attachments,
            audio_data: msg.audio_data.clone(),
            audio_file_name: msg.audio_file_name.clone(),
            audio_mime_type: msg.audio_mime_type.clone(),
        }
    }
}

/// Parse a webhook reply body into a message, if it is JSON at all.
#[must_use]
pub fn chat_history_from_json(body: &str) -> Option<ChatHistory> {
    serde_json::from_str::<ChatHistoryDoc>(body)
        .ok()
        .map(ChatHistoryDoc::into_model)
}

/// Parse a chat-history listing: `{ chatHistory: [...] }` or a bare array.
pub fn chat_histories_from_value(value: Value) -> crate::Result<Vec<ChatHistory>> {
    let value = unwrap_envelope(value);
    let items = value
        .get("chatHistory")
        .or_else(|| value.get("chat_history"))
        .and_then(Value::as_array)
        .cloned()
        .or_else(|| value.as_array().cloned())
        .unwrap_or_default();
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<ChatHistoryDoc>(item)
                .map(ChatHistoryDoc::into_model)
                .map_err(|e| crate::ClientError::Api(format!("invalid history entry: {e}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

/// Wire form of a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatDoc {
    #[serde(deserialize_with = "de_stringy")]
    pub id: String,
    #[serde(alias = "assistantId", deserialize_with = "de_stringy")]
    pub assistant_id: String,
    pub title: String,
    #[serde(deserialize_with = "de_countish")]
    pub unread: u32,
    #[serde(alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(alias = "lastMessageDate", skip_serializing_if = "Option::is_none")]
    pub last_message_date: Option<String>,
}

impl ChatDoc {
    #[must_use]
    pub fn into_model(self) -> Chat {
        Chat {
            id: self.id,
            assistant_id: self.assistant_id,
            title: self.title,
            unread: self.unread,
            is_starred: false,
            star_order: None,
            created_at: parse_date(self.created_at.as_deref()),
            last_message_date: parse_date(self.last_message_date.as_deref()),
        }
    }
}

/// Parse a chat-list payload. The backend returns either a bare array or
/// the same array wrapped in a single-element envelope.
pub fn chats_from_value(value: Value) -> crate::Result<Vec<Chat>> {
    // A one-element list unwraps to its lone object; re-wrap it.
    let items = match unwrap_envelope(value) {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(crate::ClientError::Api(format!(
                "expected chat array, got: {other}"
            )));
        }
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<ChatDoc>(item)
                .map(ChatDoc::into_model)
                .map_err(|e| crate::ClientError::Api(format!("invalid chat entry: {e}")))
        })
        .collect()
}

/// Parse a single-chat payload: a bare object or an array holding one.
pub fn chat_from_value(value: Value) -> crate::Result<Chat> {
    let value = unwrap_envelope(value);
    let value = match value {
        Value::Array(mut items) if !items.is_empty() => items.remove(0),
        Value::Array(_) | Value::Null => {
            return Err(crate::ClientError::Api("no chat data returned".to_owned()));
        }
        other => other,
    };
    serde_json::from_value::<ChatDoc>(value)
        .map(ChatDoc::into_model)
        .map_err(|e| crate::ClientError::Api(format!("invalid chat entry: {e}")))
}

// ---------------------------------------------------------------------------
// Assistants
// ---------------------------------------------------------------------------

/// Wire form of an assistant. The server's webhook field is `webhook`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantDoc {
    #[serde(deserialize_with = "de_stringy")]
    pub id: String,
    #[serde(alias = "userId", deserialize_with = "de_stringy")]
    pub user_id: String,
    pub name: String,
    pub subtitle: String,
    #[serde(alias = "avatarUrl")]
    pub avatar_url: String,
    #[serde(alias = "webhook_url", alias = "webhookUrl")]
    pub webhook: String,
    #[serde(alias = "s2sToken")]
    pub s2s_token: String,
    pub code: String,
}

impl AssistantDoc {
    #[must_use]
    pub fn into_model(self) -> Assistant {
        Assistant {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            subtitle: self.subtitle,
            avatar_url: self.avatar_url,
            webhook_url: self.webhook,
            s2s_token: self.s2s_token,
            code: self.code,
            is_starred: false,
            star_order: None,
        }
    }
}

/// Parse an assistant-list payload (same envelope tolerance as chats).
pub fn assistants_from_value(value: Value) -> crate::Result<Vec<Assistant>> {
    let items = match unwrap_envelope(value) {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(crate::ClientError::Api(format!(
                "expected assistant array, got: {other}"
            )));
        }
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<AssistantDoc>(item)
                .map(AssistantDoc::into_model)
                .map_err(|e| crate::ClientError::Api(format!("invalid assistant entry: {e}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Unread counts
// ---------------------------------------------------------------------------

/// Fold an unread-messages payload into `chat id → unread count`,
/// skipping malformed entries.
#[must_use]
pub fn unread_map_from_value(value: Value) -> HashMap<String, u32> {
    let value = unwrap_envelope(value);
    let items = value
        .get("unreadChats")
        .or_else(|| value.get("unread_chats"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut map = HashMap::new();
    for item in items {
        let id = match item.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        let Some(unread) = item.get("unread").and_then(Value::as_u64) else {
            continue;
        };
        map.insert(id, unread as u32);
    }
    map
}

/// Strip the n8n single-element array envelope, if present.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Array(mut items)
            if items.len() == 1 && (items[0].is_object() || items[0].is_array()) =>
        {
            items.remove(0)
        }
        other => other,
    }
}
