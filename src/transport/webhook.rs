//! HTTP delivery to an assistant's n8n webhook.

use std::time::Duration;

use async_trait::async_trait;

use super::{MessageTransport, OutboundRequest, TransportError};
use crate::model::ChatHistory;
use crate::wire;

/// Sends messages to one assistant webhook as `multipart/form-data`.
pub struct WebhookClient {
    http: reqwest::Client,
    webhook_url: String,
    user_id: String,
    timeout_secs: u64,
}

impl WebhookClient {
    /// Build a client for `{webhook_url}/{user_id}`.
    pub fn new(
        webhook_url: impl Into<String>,
        user_id: impl Into<String>,
        timeout_secs: u64,
    ) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| crate::ClientError::Transport(format!("failed to build client: {e}")))?;
        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
            user_id: user_id.into(),
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.webhook_url.trim_end_matches('/'),
            self.user_id
        )
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else if error.is_connect() {
            TransportError::Network(
                "unable to connect to webhook server; check URL and internet connection"
                    .to_owned(),
            )
        } else {
            TransportError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl MessageTransport for WebhookClient {
    async fn deliver(&self, message: &ChatHistory) -> Result<ChatHistory, TransportError> {
        let url = self.endpoint();
        let request = OutboundRequest::from_message(&url, message);
        let form = request.into_multipart()?;

        tracing::debug!(chat_id = %message.chat_id, %url, "delivering message");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        Ok(parse_reply(&message.chat_id, &body))
    }
}

/// Turn a 2xx webhook body into a renderable assistant message.
///
/// JSON bodies go through the shared wire mapping; non-JSON bodies
/// become the message text verbatim; empty bodies become a generic
/// server-error entry.
fn parse_reply(chat_id: &str, body: &str) -> ChatHistory {
    if body.trim().is_empty() {
        return ChatHistory::assistant_error(chat_id, "Server Error");
    }
    match wire::chat_history_from_json(body) {
        Some(mut reply) => {
            if reply.chat_id.is_empty() {
                reply.chat_id = chat_id.to_owned();
            }
            reply
        }
        None => ChatHistory::assistant_text(chat_id, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::model::Sender;

    #[test]
    fn empty_body_becomes_server_error() {
        let reply = parse_reply("c1", "   ");
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.text, "Server Error");
        assert_eq!(reply.chat_id, "c1");
    }

    #[test]
    fn json_body_maps_through_wire() {
        let reply = parse_reply(
            "c1",
            r#"{"id":"7","chat_id":"c1","sender":"assistant","text":"hello"}"#,
        );
        assert_eq!(reply.id, "7");
        assert_eq!(reply.text, "hello");
    }

    #[test]
    fn json_body_without_chat_id_inherits_request_chat() {
        let reply = parse_reply("c9", r#"{"text":"hi"}"#);
        assert_eq!(reply.chat_id, "c9");
    }

    #[test]
    fn plain_text_body_becomes_message_text() {
        let reply = parse_reply("c1", "Workflow was started");
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.text, "Workflow was started");
    }

    #[test]
    fn endpoint_joins_url_and_user() {
        let client = WebhookClient::new("https://n8n.example/webhook/abc/", "u-1", 120).unwrap();
        assert_eq!(client.endpoint(), "https://n8n.example/webhook/abc/u-1");
    }
}
