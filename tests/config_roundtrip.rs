//! Config file round-trip tests.

use bgos_client::ClientConfig;

#[test]
fn toml_file_round_trips_assistants() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[user]
id = "u-42"

[api]
base_url = "https://backend.example/webhook/base"
timeout_secs = 15

[webhook]
request_timeout_secs = 90

[voice]
api_key = "xi-key"
max_reconnect_attempts = 4

[[assistants]]
code = "ava"
name = "Ava"
subtitle = "General assistant"
webhook_url = "https://n8n.example/webhook/ava"

[[assistants]]
code = "sales"
name = "Sales"
webhook_url = "https://n8n.example/webhook/sales"
s2s_token = "s2s-abc"
"#,
    )
    .expect("write config");

    let config = ClientConfig::from_file(&path).expect("parse");
    assert_eq!(config.user.id, "u-42");
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.webhook.request_timeout_secs, 90);
    assert_eq!(config.voice.api_key, "xi-key");
    assert_eq!(config.voice.max_reconnect_attempts, 4);
    // Unspecified voice fields keep their defaults.
    assert_eq!(config.voice.reconnect_base_delay_ms, 1000);

    // Serialize and parse again: assistants survive unchanged.
    let serialized = toml::to_string(&config).expect("serialize");
    let reparsed = ClientConfig::from_toml(&serialized).expect("reparse");
    assert_eq!(reparsed.assistants.len(), 2);
    let sales = reparsed.assistant("sales").expect("sales assistant");
    assert_eq!(sales.name, "Sales");
    assert_eq!(sales.s2s_token, "s2s-abc");
    assert_eq!(sales.webhook_url, "https://n8n.example/webhook/sales");
}

#[test]
fn missing_file_is_an_error_with_path_context() {
    let error = ClientConfig::from_file("/nonexistent/bgos.toml").expect_err("should fail");
    assert!(error.to_string().contains("/nonexistent/bgos.toml"));
}
