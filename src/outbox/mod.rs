//! Outbound message queue.
//!
//! Accepts arbitrarily fast sends without blocking the caller while
//! guaranteeing that webhook calls happen one at a time, in submission
//! order. Enqueueing writes an optimistic entry into the store
//! immediately; a single worker task drains the queue FIFO and drives
//! each entry through `queued → sending → sent | failed`.
//!
//! Outbox instances are independent: each open chat owns its own queue,
//! so sends are serialized per chat, not globally.

pub mod guard;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::mpsc;

pub use guard::SubmitGuard;

use crate::model::{ChatHistory, FileInfo, MessageStatus, VoiceRecording};
use crate::store::{Action, ChatHistoryAction, MessageUpdate, Store};
use crate::transport::MessageTransport;

/// Envelope held in the queue while a message waits its turn.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub id: String,
    pub chat_id: String,
    pub text: String,
    pub files: Vec<FileInfo>,
    pub voice: Option<VoiceRecording>,
}

/// Progress notifications for UI layers.
#[derive(Debug, Clone)]
pub enum OutboxEvent {
    /// A message entered the queue with its initial status.
    Enqueued { id: String, status: MessageStatus },
    /// A queued message moved through its lifecycle.
    StatusChanged { id: String, status: MessageStatus },
    /// The assistant's reply was added to the store.
    ReplyReceived { message: ChatHistory },
    /// Delivery failed; a synthetic assistant message was added.
    SendFailed { id: String, error: String },
    /// A send was rejected before enqueueing (missing webhook URL).
    Rejected { reason: String },
}

/// Handle to one chat's outbound queue. Cheap to clone.
#[derive(Clone)]
pub struct Outbox {
    chat_id: String,
    queue_tx: mpsc::UnboundedSender<QueuedMessage>,
    pending: Arc<AtomicUsize>,
    in_flight: Arc<AtomicBool>,
    store: Arc<Store>,
    event_tx: mpsc::UnboundedSender<OutboxEvent>,
    has_transport: bool,
}

impl Outbox {
    /// Create the queue and spawn its worker task.
    ///
    /// Pass `None` for `transport` when the assistant has no webhook URL
    /// configured; every send then produces a synthetic error message
    /// without touching the queue.
    #[must_use]
    pub fn spawn(
        transport: Option<Arc<dyn MessageTransport>>,
        store: Arc<Store>,
        chat_id: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<OutboxEvent>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicBool::new(false));

        let has_transport = transport.is_some();
        if let Some(transport) = transport {
            tokio::spawn(run_worker(
                queue_rx,
                transport,
                Arc::clone(&store),
                Arc::clone(&pending),
                Arc::clone(&in_flight),
                event_tx.clone(),
            ));
        }

        (
            Self {
                chat_id: chat_id.into(),
                queue_tx,
                pending,
                in_flight,
                store,
                event_tx,
                has_transport,
            },
            event_rx,
        )
    }

    /// Enqueue a message for delivery. Never blocks.
    ///
    /// Returns the optimistic message id, or `None` when nothing was
    /// enqueued (empty send, or missing webhook configuration).
    pub fn send_message(
        &self,
        text: &str,
        files: Vec<FileInfo>,
        voice: Option<VoiceRecording>,
        override_chat_id: Option<String>,
    ) -> Option<String> {
        if text.trim().is_empty() && files.is_empty() && voice.is_none() {
            return None;
        }

        let chat_id = override_chat_id.unwrap_or_else(|| self.chat_id.clone());

        if !self.has_transport {
            let reason = "no webhook URL is configured for this assistant".to_owned();
            tracing::warn!(chat_id = %chat_id, "{reason}");
            self.store
                .dispatch(Action::ChatHistory(ChatHistoryAction::Add(
                    ChatHistory::assistant_error(&chat_id, &reason),
                )));
            let _ = self.event_tx.send(OutboxEvent::Rejected { reason });
            return None;
        }

        let busy = self.in_flight.load(Ordering::SeqCst) || self.pending.load(Ordering::SeqCst) > 0;
        let status = if busy {
            MessageStatus::Queued
        } else {
            MessageStatus::Sending
        };

        let optimistic =
            ChatHistory::optimistic(&chat_id, text, files.clone(), voice.as_ref(), status);
        let id = optimistic.id.clone();

        // The input stays responsive: the entry is visible before any
        // network activity happens.
        self.store
            .dispatch(Action::ChatHistory(ChatHistoryAction::Add(optimistic)));

        self.pending.fetch_add(1, Ordering::SeqCst);
        let queued = QueuedMessage {
            id: id.clone(),
            chat_id,
            text: text.to_owned(),
            files,
            voice,
        };
        if self.queue_tx.send(queued).is_err() {
            // Worker is gone; reflect the failure instead of losing the send.
            self.pending.fetch_sub(1, Ordering::SeqCst);
            self.store
                .dispatch(Action::ChatHistory(ChatHistoryAction::UpdateStatus {
                    id: id.clone(),
                    status: MessageStatus::Failed,
                }));
            let _ = self.event_tx.send(OutboxEvent::StatusChanged {
                id: id.clone(),
                status: MessageStatus::Failed,
            });
            return Some(id);
        }

        let _ = self.event_tx.send(OutboxEvent::Enqueued {
            id: id.clone(),
            status,
        });
        Some(id)
    }

    /// Number of messages waiting in the queue (not counting the one in
    /// flight).
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether a delivery is currently in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Drain the queue one message at a time until all senders are gone.
async fn run_worker(
    mut queue_rx: mpsc::UnboundedReceiver<QueuedMessage>,
    transport: Arc<dyn MessageTransport>,
    store: Arc<Store>,
    pending: Arc<AtomicUsize>,
    in_flight: Arc<AtomicBool>,
    event_tx: mpsc::UnboundedSender<OutboxEvent>,
) {
    while let Some(queued) = queue_rx.recv().await {
        in_flight.store(true, Ordering::SeqCst);
        pending.fetch_sub(1, Ordering::SeqCst);

        // Refresh the timestamp so the entry reorders after any
        // assistant reply that arrived while it sat in the queue.
        let sent_date = Utc::now();
        store.dispatch(Action::ChatHistory(ChatHistoryAction::Update {
            id: queued.id.clone(),
            updates: MessageUpdate {
                status: Some(MessageStatus::Sending),
                sent_date: Some(sent_date),
                text: None,
            },
        }));
        let _ = event_tx.send(OutboxEvent::StatusChanged {
            id: queued.id.clone(),
            status: MessageStatus::Sending,
        });

        let mut outbound = ChatHistory::optimistic(
            &queued.chat_id,
            queued.text.clone(),
            queued.files.clone(),
            queued.voice.as_ref(),
            MessageStatus::Sending,
        );
        outbound.id = queued.id.clone();
        outbound.sent_date = sent_date;
        // The attachment placeholder is display-only; the wire carries
        // the text as typed.
        outbound.text = queued.text.clone();

        match transport.deliver(&outbound).await {
            Ok(reply) => {
                store.dispatch(Action::ChatHistory(ChatHistoryAction::UpdateStatus {
                    id: queued.id.clone(),
                    status: MessageStatus::Sent,
                }));
                let _ = event_tx.send(OutboxEvent::StatusChanged {
                    id: queued.id.clone(),
                    status: MessageStatus::Sent,
                });
                store.dispatch(Action::ChatHistory(ChatHistoryAction::Add(reply.clone())));
                let _ = event_tx.send(OutboxEvent::ReplyReceived { message: reply });
            }
            Err(error) => {
                tracing::warn!(id = %queued.id, "message delivery failed: {error}");
                store.dispatch(Action::ChatHistory(ChatHistoryAction::UpdateStatus {
                    id: queued.id.clone(),
                    status: MessageStatus::Failed,
                }));
                let _ = event_tx.send(OutboxEvent::StatusChanged {
                    id: queued.id.clone(),
                    status: MessageStatus::Failed,
                });
                // The conversation still gets a renderable entry.
                store.dispatch(Action::ChatHistory(ChatHistoryAction::Add(
                    ChatHistory::assistant_error(&queued.chat_id, error.to_string()),
                )));
                let _ = event_tx.send(OutboxEvent::SendFailed {
                    id: queued.id.clone(),
                    error: error.to_string(),
                });
            }
        }

        in_flight.store(false, Ordering::SeqCst);
    }
    tracing::debug!("outbox worker stopped");
}
