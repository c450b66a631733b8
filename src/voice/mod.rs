//! Real-time voice-agent integration: typed events over a WebSocket
//! with reconnect-and-backoff.

pub mod events;
pub mod service;

pub use events::{error_codes, EventKind, VoiceEvent};
pub use service::{ConnectionState, ListenerId, ReconnectPolicy, VoiceEventService};
