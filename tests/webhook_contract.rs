//! Webhook transport contract tests.
//!
//! Verify the exact HTTP shape of outbound sends (multipart form fields)
//! and that every response shape the backend produces — snake_case JSON,
//! camelCase JSON, plain text, empty body, error status — maps to a
//! renderable result.

use bgos_client::model::{ChatHistory, MessageStatus, Sender, VoiceRecording};
use bgos_client::transport::{MessageTransport, TransportError, WebhookClient};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn outbound(text: &str) -> ChatHistory {
    ChatHistory::optimistic("c1", text, Vec::new(), None, MessageStatus::Sending)
}

#[tokio::test]
async fn posts_multipart_with_required_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook/abc/u-1"))
        .and(body_string_contains("name=\"chatId\""))
        .and(body_string_contains("name=\"sender\""))
        .and(body_string_contains("name=\"sentDate\""))
        .and(body_string_contains("name=\"text\""))
        .and(body_string_contains("name=\"isAudio\""))
        .and(body_string_contains("name=\"hasAttachment\""))
        .and(body_string_contains("hello webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "101",
            "chat_id": "c1",
            "sender": "assistant",
            "sent_date": "2025-11-02T10:00:00Z",
            "text": "hi!"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebhookClient::new(format!("{}/webhook/abc", server.uri()), "u-1", 30).unwrap();
    let reply = client.deliver(&outbound("hello webhook")).await.unwrap();

    assert_eq!(reply.id, "101");
    assert_eq!(reply.sender, Sender::Assistant);
    assert_eq!(reply.text, "hi!");
}

#[tokio::test]
async fn voice_message_sends_binary_audio_part() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("name=\"audioFileName\""))
        .and(body_string_contains("name=\"audioData\""))
        .and(body_string_contains("name=\"audioFile\""))
        .and(body_string_contains("filename=\"note.webm\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "1", "chat_id": "c1", "text": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let voice = VoiceRecording {
        audio_data: "UklGRmRhdGE=".to_owned(),
        audio_file_name: "note.webm".to_owned(),
        audio_mime_type: "audio/webm".to_owned(),
        duration: 1.5,
    };
    let message = ChatHistory::optimistic("c1", "", Vec::new(), Some(&voice), MessageStatus::Sending);

    let client = WebhookClient::new(server.uri(), "u-1", 30).unwrap();
    let reply = client.deliver(&message).await.unwrap();
    assert_eq!(reply.text, "ok");
}

#[tokio::test]
async fn camel_case_response_maps_through_aliases() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "7",
            "chatId": "c1",
            "sender": "assistant",
            "sentDate": "2025-11-02T10:00:00Z",
            "text": "aliased",
            "isAudio": true,
            "audioFileName": "reply.mp3"
        })))
        .mount(&server)
        .await;

    let client = WebhookClient::new(server.uri(), "u-1", 30).unwrap();
    let reply = client.deliver(&outbound("x")).await.unwrap();

    assert_eq!(reply.chat_id, "c1");
    assert!(reply.is_audio);
    assert_eq!(reply.audio_file_name.as_deref(), Some("reply.mp3"));
}

#[tokio::test]
async fn plain_text_response_becomes_message_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Workflow was started"))
        .mount(&server)
        .await;

    let client = WebhookClient::new(server.uri(), "u-1", 30).unwrap();
    let reply = client.deliver(&outbound("x")).await.unwrap();

    assert_eq!(reply.sender, Sender::Assistant);
    assert_eq!(reply.text, "Workflow was started");
    assert_eq!(reply.chat_id, "c1");
}

#[tokio::test]
async fn empty_response_becomes_server_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = WebhookClient::new(server.uri(), "u-1", 30).unwrap();
    let reply = client.deliver(&outbound("x")).await.unwrap();

    assert_eq!(reply.text, "Server Error");
}

#[tokio::test]
async fn error_status_is_classified_not_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = WebhookClient::new(server.uri(), "u-1", 30).unwrap();
    let error = client.deliver(&outbound("x")).await.unwrap_err();

    match error {
        TransportError::Status { status, ref body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
    assert!(error.to_string().contains("HTTP 502"));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Nothing listens on this port.
    let client = WebhookClient::new("http://127.0.0.1:9", "u-1", 5).unwrap();
    let error = client.deliver(&outbound("x")).await.unwrap_err();
    assert!(matches!(
        error,
        TransportError::Network(_) | TransportError::Timeout(_)
    ));
}
