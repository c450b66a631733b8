//! Message delivery to assistant webhooks.
//!
//! The queue worker talks to a [`MessageTransport`] trait object so tests
//! can substitute an in-memory transport; [`WebhookClient`] is the real
//! HTTP implementation.

pub mod request;
pub mod webhook;

use async_trait::async_trait;

pub use request::{FormPart, OutboundRequest};
pub use webhook::WebhookClient;

use crate::model::ChatHistory;

/// Delivery failure, classified for user-facing error text.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request exceeded the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The webhook server could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("Server error: HTTP {status}")]
    Status { status: u16, body: String },
}

/// Delivers one outbound message and returns the assistant's reply.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn deliver(&self, message: &ChatHistory) -> Result<ChatHistory, TransportError>;
}
