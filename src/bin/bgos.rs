//! Minimal line-oriented chat client.
//!
//! Usage: `bgos <assistant-code> [chat-id]` with config from
//! `BGOS_CONFIG` or the platform config dir.

use bgos_client::{ChatClient, ClientConfig, OutboxEvent};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("bgos failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bgos_client=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(assistant_code) = args.next() else {
        eprintln!("usage: bgos <assistant-code> [chat-id]");
        std::process::exit(2);
    };
    let chat_id = args.next().unwrap_or_else(|| "local".to_owned());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(chat_loop(assistant_code, chat_id))
}

async fn chat_loop(assistant_code: String, chat_id: String) -> anyhow::Result<()> {
    let config = ClientConfig::load()?;
    let client = ChatClient::new(config)?;
    client.sync().await?;

    let assistant = client.assistant_by_code(&assistant_code)?;
    println!("chatting with {} (chat {chat_id}) — ctrl-d to quit", assistant.name);

    let (outbox, mut events) = client.outbox_for(&assistant, &chat_id)?;

    // Print queue progress and replies as they arrive.
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                OutboxEvent::ReplyReceived { message } => {
                    println!("{}: {}", assistant_code, message.text);
                }
                OutboxEvent::SendFailed { error, .. } => {
                    println!("(failed) {error}");
                }
                OutboxEvent::Rejected { reason } => {
                    println!("(rejected) {reason}");
                }
                OutboxEvent::Enqueued { .. } | OutboxEvent::StatusChanged { .. } => {}
            }
        }
    });

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        outbox.send_message(line.trim(), Vec::new(), None, None);
    }

    drop(outbox);
    let _ = printer.await;
    Ok(())
}
