//! Backend REST client for chats, assistants, history and unread counts.
//!
//! The backend is itself an n8n workflow, so responses are plain JSON
//! that sometimes arrives wrapped in a single-element array; the wire
//! module normalizes both shapes.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::error::{ClientError, Result};
use crate::model::{Assistant, Chat, ChatHistory};
use crate::wire;

/// Assistants and chats fetched in one round trip.
#[derive(Debug, Clone)]
pub struct AssistantsWithChats {
    pub assistants: Vec<Assistant>,
    pub chats: Vec<Chat>,
}

/// Thin wrapper over the chat CRUD backend.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Api(format!("failed to build client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_json(&self, path: &str, what: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ClientError::Api(format!("failed to fetch {what}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api(format!(
                "failed to fetch {what}: HTTP {status}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Api(format!("invalid {what} response: {e}")))
    }

    /// `GET /{user_id}/chats`
    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<Chat>> {
        let value = self.get_json(&format!("{user_id}/chats"), "chats").await?;
        wire::chats_from_value(value)
    }

    /// `POST /{user_id}/chats` — create a chat seeded with its first message.
    pub async fn create_chat(
        &self,
        user_id: &str,
        assistant_id: &str,
        first_message: &str,
    ) -> Result<Chat> {
        let response = self
            .http
            .post(self.url(&format!("{user_id}/chats")))
            .json(&json!({
                "assistantId": assistant_id,
                "chatFirstMessage": first_message,
            }))
            .send()
            .await
            .map_err(|e| ClientError::Api(format!("failed to create chat: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api(format!(
                "failed to create chat: HTTP {status}"
            )));
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Api(format!("invalid create-chat response: {e}")))?;

        wire::chat_from_value(value)
    }

    /// `PATCH /chats/{user_id}/{chat_id}`
    pub async fn rename_chat(&self, user_id: &str, chat_id: &str, title: &str) -> Result<()> {
        let response = self
            .http
            .patch(self.url(&format!("chats/{user_id}/{chat_id}")))
            .json(&json!({ "title": title }))
            .send()
            .await
            .map_err(|e| ClientError::Api(format!("failed to rename chat: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api(format!(
                "failed to rename chat: HTTP {status}"
            )));
        }
        Ok(())
    }

    /// `DELETE /chats/{user_id}/{chat_id}`
    pub async fn delete_chat(&self, user_id: &str, chat_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("chats/{user_id}/{chat_id}")))
            .send()
            .await
            .map_err(|e| ClientError::Api(format!("failed to delete chat: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api(format!(
                "failed to delete chat: HTTP {status}"
            )));
        }
        Ok(())
    }

    /// `GET /chat-name/{user_id}/{chat_id}` — server-generated title, if any.
    pub async fn chat_name(&self, user_id: &str, chat_id: &str) -> Result<Option<String>> {
        let value = self
            .get_json(&format!("chat-name/{user_id}/{chat_id}"), "chat name")
            .await?;
        Ok(value
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_owned))
    }

    /// `GET /unread-messages/{user_id}` folded into `chat id → count`.
    pub async fn unread_messages(&self, user_id: &str) -> Result<HashMap<String, u32>> {
        let value = self
            .get_json(&format!("unread-messages/{user_id}"), "unread messages")
            .await?;
        Ok(wire::unread_map_from_value(value))
    }

    /// `GET /assistants-with-chats/{user_id}` — initial sync payload.
    pub async fn assistants_with_chats(&self, user_id: &str) -> Result<AssistantsWithChats> {
        let value = self
            .get_json(
                &format!("assistants-with-chats/{user_id}"),
                "assistants with chats",
            )
            .await?;
        let assistants = value
            .get("assistants")
            .cloned()
            .map(wire::assistants_from_value)
            .transpose()?
            .unwrap_or_default();
        let chats = value
            .get("chats")
            .cloned()
            .map(wire::chats_from_value)
            .transpose()?
            .unwrap_or_default();
        Ok(AssistantsWithChats { assistants, chats })
    }

    /// `GET /chat-history/{user_id}/{chat_id}`
    pub async fn chat_history(&self, user_id: &str, chat_id: &str) -> Result<Vec<ChatHistory>> {
        let value = self
            .get_json(&format!("chat-history/{user_id}/{chat_id}"), "chat history")
            .await?;
        wire::chat_histories_from_value(value)
    }
}
