//! BGOS client core: a headless multi-assistant webhook chat client.
//!
//! Conversations flow through a small set of cooperating pieces:
//!
//! - **Store** — typed application state mutated only through dispatched
//!   actions; reducers run synchronously under one lock.
//! - **Outbox** — per-chat FIFO queue of outbound messages, drained one
//!   at a time by a dedicated worker task. Enqueueing writes an
//!   optimistic entry into the store, so the input never blocks on the
//!   network.
//! - **Webhook transport** — serializes a message to
//!   `multipart/form-data` and posts it to the assistant's n8n webhook;
//!   replies map back through one shared wire module.
//! - **Backend API** — chat/assistant CRUD and unread counters.
//! - **Voice events** — typed WebSocket event stream for the realtime
//!   voice-agent mode, with reconnect-and-backoff.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod outbox;
pub mod store;
pub mod transport;
pub mod voice;
pub mod wire;

pub use client::ChatClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use model::{Assistant, Chat, ChatHistory, FileInfo, MessageStatus, Sender, VoiceRecording};
pub use outbox::{Outbox, OutboxEvent, SubmitGuard};
pub use store::{Action, Store};
pub use transport::{MessageTransport, TransportError, WebhookClient};
pub use voice::{VoiceEvent, VoiceEventService};
