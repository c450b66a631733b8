//! Outbox behavior under load: ordering, single-flight, status
//! lifecycle, and failure isolation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bgos_client::model::{ChatHistory, MessageStatus};
use bgos_client::outbox::{Outbox, OutboxEvent};
use bgos_client::store::Store;
use bgos_client::transport::{MessageTransport, TransportError};
use tokio::sync::Semaphore;

/// Transport that records delivery order, tracks peak concurrency, and
/// only proceeds when the test grants a permit.
struct GatedTransport {
    delivered: Mutex<Vec<String>>,
    permits: Semaphore,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl GatedTransport {
    fn new(initial_permits: usize) -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            permits: Semaphore::new(initial_permits),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for GatedTransport {
    async fn deliver(&self, message: &ChatHistory) -> Result<ChatHistory, TransportError> {
        let in_flight = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);

        // Consume the permit for good; each release() grants one delivery.
        self.permits
            .acquire()
            .await
            .expect("semaphore closed")
            .forget();
        self.delivered.lock().unwrap().push(message.text.clone());

        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(ChatHistory::assistant_text(
            &message.chat_id,
            format!("re: {}", message.text),
        ))
    }
}

async fn wait_idle(outbox: &Outbox) {
    while outbox.queue_len() > 0 || outbox.is_processing() {
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
}

#[tokio::test]
async fn n_sends_invoke_transport_n_times_fifo_and_single_flight() {
    let store = Arc::new(Store::new());
    let transport = Arc::new(GatedTransport::new(0));
    let dyn_transport: Arc<dyn MessageTransport> = transport.clone();
    let (outbox, _events) = Outbox::spawn(Some(dyn_transport), Arc::clone(&store), "c1");

    let n = 8;
    for i in 0..n {
        outbox.send_message(&format!("msg {i}"), Vec::new(), None, None);
    }
    transport.release(n);
    wait_idle(&outbox).await;

    let expected: Vec<String> = (0..n).map(|i| format!("msg {i}")).collect();
    assert_eq!(transport.delivered(), expected);
    assert_eq!(transport.peak.load(Ordering::SeqCst), 1);

    // Every send produced exactly one user entry plus one reply.
    let user_messages = store.select(|s| {
        s.chat_history
            .list
            .iter()
            .filter(|m| m.sender == bgos_client::Sender::User)
            .count()
    });
    assert_eq!(user_messages, n);
}

#[tokio::test]
async fn status_walks_queued_sending_sent_without_reverting() {
    let store = Arc::new(Store::new());
    let transport = Arc::new(GatedTransport::new(0));
    let dyn_transport: Arc<dyn MessageTransport> = transport.clone();
    let (outbox, mut events) = Outbox::spawn(Some(dyn_transport), Arc::clone(&store), "c1");

    let first = outbox.send_message("first", Vec::new(), None, None).unwrap();
    // Wait until the worker actually picked up the first message.
    while !outbox.is_processing() {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    let second = outbox.send_message("second", Vec::new(), None, None).unwrap();

    transport.release(2);
    wait_idle(&outbox).await;
    drop(outbox);

    let mut first_statuses = Vec::new();
    let mut second_statuses = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            OutboxEvent::Enqueued { id, status } | OutboxEvent::StatusChanged { id, status } => {
                if id == first {
                    first_statuses.push(status);
                } else if id == second {
                    second_statuses.push(status);
                }
            }
            _ => {}
        }
    }

    // The idle queue starts at Sending; the busy queue starts at Queued.
    assert_eq!(
        first_statuses,
        vec![
            MessageStatus::Sending,
            MessageStatus::Sending,
            MessageStatus::Sent
        ]
    );
    assert_eq!(
        second_statuses,
        vec![
            MessageStatus::Queued,
            MessageStatus::Sending,
            MessageStatus::Sent
        ]
    );
}

#[tokio::test]
async fn send_while_busy_starts_queued() {
    let store = Arc::new(Store::new());
    let transport = Arc::new(GatedTransport::new(0));
    let dyn_transport: Arc<dyn MessageTransport> = transport.clone();
    let (outbox, _events) = Outbox::spawn(Some(dyn_transport), Arc::clone(&store), "c1");

    outbox.send_message("in flight", Vec::new(), None, None);
    while !outbox.is_processing() {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    let queued_id = outbox.send_message("waiting", Vec::new(), None, None).unwrap();
    let status = store.select(|s| s.chat_history.message(&queued_id).unwrap().status);
    assert_eq!(status, Some(MessageStatus::Queued));

    transport.release(2);
    wait_idle(&outbox).await;

    let status = store.select(|s| s.chat_history.message(&queued_id).unwrap().status);
    assert_eq!(status, Some(MessageStatus::Sent));
}

#[tokio::test]
async fn sending_refreshes_sent_date_for_reordering() {
    let store = Arc::new(Store::new());
    let transport = Arc::new(GatedTransport::new(0));
    let dyn_transport: Arc<dyn MessageTransport> = transport.clone();
    let (outbox, _events) = Outbox::spawn(Some(dyn_transport), Arc::clone(&store), "c1");

    outbox.send_message("blocker", Vec::new(), None, None);
    while !outbox.is_processing() {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    let queued_id = outbox.send_message("queued", Vec::new(), None, None).unwrap();
    let enqueued_at = store.select(|s| s.chat_history.message(&queued_id).unwrap().sent_date);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    transport.release(2);
    wait_idle(&outbox).await;

    let sent_at = store.select(|s| s.chat_history.message(&queued_id).unwrap().sent_date);
    assert!(sent_at > enqueued_at);
}

/// Transport that always fails.
struct FailingTransport;

#[async_trait]
impl MessageTransport for FailingTransport {
    async fn deliver(&self, _message: &ChatHistory) -> Result<ChatHistory, TransportError> {
        Err(TransportError::Status {
            status: 500,
            body: "boom".to_owned(),
        })
    }
}

#[tokio::test]
async fn failure_marks_message_failed_and_queue_continues() {
    let store = Arc::new(Store::new());
    let failing: Arc<dyn MessageTransport> = Arc::new(FailingTransport);
    let (outbox, mut events) = Outbox::spawn(Some(failing), Arc::clone(&store), "c1");

    let a = outbox.send_message("a", Vec::new(), None, None).unwrap();
    let b = outbox.send_message("b", Vec::new(), None, None).unwrap();
    wait_idle(&outbox).await;
    drop(outbox);

    let (status_a, status_b) = store.select(|s| {
        (
            s.chat_history.message(&a).unwrap().status,
            s.chat_history.message(&b).unwrap().status,
        )
    });
    assert_eq!(status_a, Some(MessageStatus::Failed));
    assert_eq!(status_b, Some(MessageStatus::Failed));

    let mut failures = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, OutboxEvent::SendFailed { .. }) {
            failures += 1;
        }
    }
    assert_eq!(failures, 2);
}
