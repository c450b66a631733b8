//! Error types for the chat client core.

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration load/validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Webhook transport error (message delivery).
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend REST API error (chats, assistants, unread counts).
    #[error("api error: {0}")]
    Api(String),

    /// Voice event stream error.
    #[error("voice error: {0}")]
    Voice(String),

    /// Store dispatch error.
    #[error("store error: {0}")]
    Store(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ClientError>;
