//! Voice-agent WebSocket event service.
//!
//! Maintains one WebSocket connection per active voice conversation,
//! re-emits typed [`VoiceEvent`]s to registered listeners, and recovers
//! from unexpected closures with exponential backoff.
//!
//! Each `connect` starts a background task stamped with a generation
//! token; `disconnect` bumps the generation, which makes the old task
//! inert before the socket even closes — the reconnect path cannot fire
//! on an intentional close, and no event is emitted after disconnect.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;

use super::events::{error_codes, EventKind, VoiceEvent};
use crate::config::VoiceConfig;

/// Reconnect behavior on abnormal closures.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given attempt (1-based): `base × 2^(attempt-1)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Observable connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
}

type Listener = Box<dyn Fn(&VoiceEvent) + Send + Sync>;

/// Handle returned by [`VoiceEventService::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

struct Shared {
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_listener_id: AtomicU64,
    state: Mutex<ConnectionState>,
    conversation: Mutex<Option<String>>,
    /// Bumped on every connect/disconnect; tasks carry the value they
    /// were spawned with and go inert when it no longer matches.
    generation: AtomicU64,
}

/// WebSocket event service for voice-agent conversations.
pub struct VoiceEventService {
    endpoint: String,
    api_key: String,
    policy: ReconnectPolicy,
    shared: Arc<Shared>,
}

impl VoiceEventService {
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            policy: ReconnectPolicy {
                max_attempts: config.max_reconnect_attempts,
                base_delay: Duration::from_millis(config.reconnect_base_delay_ms),
            },
            shared: Arc::new(Shared {
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
                state: Mutex::new(ConnectionState::Closed),
                conversation: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Register a listener for one event kind.
    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&VoiceEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.shared.next_listener_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.shared.listeners)
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener.
    pub fn off(&self, kind: EventKind, id: ListenerId) {
        if let Some(listeners) = lock(&self.shared.listeners).get_mut(&kind) {
            listeners.retain(|(listener_id, _)| *listener_id != id);
        }
    }

    /// Drop all listeners for a kind, or every listener when `None`.
    pub fn remove_all_listeners(&self, kind: Option<EventKind>) {
        let mut listeners = lock(&self.shared.listeners);
        match kind {
            Some(kind) => {
                listeners.remove(&kind);
            }
            None => listeners.clear(),
        }
    }

    /// Open the event stream for a conversation.
    ///
    /// No-op with a warning when a connection is already open. Must be
    /// called from within a tokio runtime.
    pub fn connect(&self, conversation_id: &str) {
        if self.connection_state() == ConnectionState::Open {
            tracing::warn!("voice event stream already connected");
            return;
        }

        *lock(&self.shared.conversation) = Some(conversation_id.to_owned());
        let token = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let shared = Arc::clone(&self.shared);
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let policy = self.policy;
        let conversation_id = conversation_id.to_owned();
        tokio::spawn(async move {
            run_connection(shared, endpoint, api_key, policy, conversation_id, token).await;
        });
    }

    /// Close the stream intentionally. Pending reconnects are cancelled
    /// and no further events reach the listeners.
    pub fn disconnect(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        *lock(&self.shared.conversation) = None;
        *lock(&self.shared.state) = ConnectionState::Closed;
        tracing::debug!("voice event stream disconnected");
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Open
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *lock(&self.shared.state)
    }

    /// The conversation currently associated with the stream.
    #[must_use]
    pub fn conversation_id(&self) -> Option<String> {
        lock(&self.shared.conversation).clone()
    }
}

impl Drop for VoiceEventService {
    fn drop(&mut self) {
        // Make any background task inert.
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn is_current(shared: &Shared, token: u64) -> bool {
    shared.generation.load(Ordering::SeqCst) == token
}

fn set_state(shared: &Shared, token: u64, state: ConnectionState) {
    if is_current(shared, token) {
        *lock(&shared.state) = state;
    }
}

/// Dispatch an event to listeners of its kind. A panicking listener is
/// isolated and logged; the rest still run.
fn emit(shared: &Shared, token: u64, event: &VoiceEvent) {
    if !is_current(shared, token) {
        return;
    }
    let listeners = lock(&shared.listeners);
    let Some(registered) = listeners.get(&event.kind()) else {
        return;
    };
    for (id, listener) in registered {
        if std::panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
            tracing::error!(listener = id.0, kind = ?event.kind(), "voice event listener panicked");
        }
    }
}

/// Result of one socket session.
enum SocketClose {
    /// Server closed with code 1000, or the session went stale.
    Clean,
    /// Anything else: connect failure, error, abnormal close code.
    Abnormal,
}

async fn run_connection(
    shared: Arc<Shared>,
    endpoint: String,
    api_key: String,
    policy: ReconnectPolicy,
    conversation_id: String,
    token: u64,
) {
    let url = format!(
        "{}/{}/events",
        endpoint.trim_end_matches('/'),
        conversation_id
    );
    let mut attempt: u32 = 0;

    loop {
        if !is_current(&shared, token) {
            return;
        }
        set_state(&shared, token, ConnectionState::Connecting);
        tracing::debug!(%url, "connecting voice event stream");

        let close = match open_socket(&url, &api_key).await {
            Ok(socket) => {
                set_state(&shared, token, ConnectionState::Open);
                attempt = 0;
                read_frames(socket, &shared, token).await
            }
            Err(err) => {
                emit(
                    &shared,
                    token,
                    &VoiceEvent::error(
                        format!("failed to connect to event stream: {err}"),
                        error_codes::CONNECTION_FAILED,
                    ),
                );
                SocketClose::Abnormal
            }
        };

        if !is_current(&shared, token) {
            return;
        }
        set_state(&shared, token, ConnectionState::Closed);

        if matches!(close, SocketClose::Clean) {
            return;
        }

        attempt += 1;
        if attempt > policy.max_attempts {
            tracing::error!(
                "giving up on voice event stream after {} reconnect attempts",
                policy.max_attempts
            );
            emit(
                &shared,
                token,
                &VoiceEvent::error(
                    "failed to reconnect to event stream",
                    error_codes::MAX_RECONNECT_ATTEMPTS,
                ),
            );
            return;
        }

        let delay = policy.delay_for(attempt);
        tracing::info!(
            "voice event stream reconnecting in {delay:?} (attempt {attempt}/{})",
            policy.max_attempts
        );
        tokio::time::sleep(delay).await;
    }
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn open_socket(url: &str, api_key: &str) -> Result<WsStream, String> {
    let mut request = url
        .into_client_request()
        .map_err(|e| format!("invalid endpoint: {e}"))?;
    if !api_key.is_empty() {
        let value =
            HeaderValue::from_str(api_key).map_err(|e| format!("invalid api key header: {e}"))?;
        request.headers_mut().insert("xi-api-key", value);
    }
    let (socket, _response) = connect_async(request)
        .await
        .map_err(|e| format!("connect: {e}"))?;
    Ok(socket)
}

/// Read frames until the socket closes, dispatching events as they come.
async fn read_frames(socket: WsStream, shared: &Arc<Shared>, token: u64) -> SocketClose {
    let (_write, mut read) = socket.split();

    while let Some(frame) = read.next().await {
        if !is_current(shared, token) {
            return SocketClose::Clean;
        }
        match frame {
            Ok(Message::Text(text)) => handle_frame(&text, shared, token),
            Ok(Message::Close(frame)) => {
                let clean = frame.as_ref().is_some_and(|f| f.code == CloseCode::Normal);
                tracing::debug!(?frame, "voice event stream closed");
                return if clean {
                    SocketClose::Clean
                } else {
                    SocketClose::Abnormal
                };
            }
            Ok(_) => {} // Binary/Ping/Pong frames handled by tungstenite.
            Err(err) => {
                emit(
                    shared,
                    token,
                    &VoiceEvent::error(
                        format!("WebSocket connection error: {err}"),
                        error_codes::WEBSOCKET_ERROR,
                    ),
                );
                return SocketClose::Abnormal;
            }
        }
    }

    // Stream ended without a close frame — the connection dropped.
    SocketClose::Abnormal
}

fn handle_frame(text: &str, shared: &Arc<Shared>, token: u64) {
    match serde_json::from_str::<VoiceEvent>(text) {
        Ok(event) => {
            tracing::trace!(kind = ?event.kind(), "voice event received");
            emit(shared, token, &event);
        }
        Err(err) => {
            tracing::debug!("unparseable voice event frame: {err}");
            emit(
                shared,
                token,
                &VoiceEvent::error(
                    "failed to parse event frame",
                    error_codes::PARSE_ERROR,
                ),
            );
        }
    }
}
