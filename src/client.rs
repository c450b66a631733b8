//! Client facade wiring config, store, backend API and outboxes.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::BackendClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::model::Assistant;
use crate::outbox::{Outbox, OutboxEvent};
use crate::store::{Action, AssistantsAction, ChatsAction, Store};
use crate::transport::{MessageTransport, WebhookClient};

/// Top-level handle for one signed-in user.
pub struct ChatClient {
    config: ClientConfig,
    store: Arc<Store>,
    backend: BackendClient,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let backend = BackendClient::new(&config.api)?;
        Ok(Self {
            config,
            store: Arc::new(Store::new()),
            backend,
        })
    }

    #[must_use]
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// Assistants from config, for running without a backend sync.
    #[must_use]
    pub fn configured_assistants(&self) -> Vec<Assistant> {
        self.config
            .assistants
            .iter()
            .map(|profile| Assistant {
                id: profile.code.clone(),
                user_id: self.config.user.id.clone(),
                name: profile.name.clone(),
                subtitle: profile.subtitle.clone(),
                avatar_url: String::new(),
                webhook_url: profile.webhook_url.clone(),
                s2s_token: profile.s2s_token.clone(),
                code: profile.code.clone(),
                is_starred: false,
                star_order: None,
            })
            .collect()
    }

    /// Pull assistants and chats from the backend into the store.
    /// Falls back to configured assistants when no backend is set.
    pub async fn sync(&self) -> Result<()> {
        if self.config.api.base_url.is_empty() {
            self.store
                .dispatch(Action::Assistants(AssistantsAction::Set(
                    self.configured_assistants(),
                )));
            return Ok(());
        }

        let synced = self
            .backend
            .assistants_with_chats(&self.config.user.id)
            .await?;
        tracing::info!(
            assistants = synced.assistants.len(),
            chats = synced.chats.len(),
            "synced from backend"
        );
        self.store
            .dispatch(Action::Assistants(AssistantsAction::Set(synced.assistants)));
        self.store
            .dispatch(Action::Chats(ChatsAction::Set(synced.chats)));
        Ok(())
    }

    /// Refresh per-chat unread counters.
    pub async fn refresh_unread(&self) -> Result<()> {
        let unread = self
            .backend
            .unread_messages(&self.config.user.id)
            .await?;
        for (id, count) in unread {
            self.store.dispatch(Action::Chats(ChatsAction::UpdateUnread {
                id,
                unread: count,
            }));
        }
        Ok(())
    }

    /// Build an outbound queue for one chat on one assistant.
    ///
    /// An assistant without a webhook URL still yields an outbox; its
    /// sends surface a synthetic error message instead of reaching the
    /// network.
    pub fn outbox_for(
        &self,
        assistant: &Assistant,
        chat_id: &str,
    ) -> Result<(Outbox, mpsc::UnboundedReceiver<OutboxEvent>)> {
        let transport: Option<Arc<dyn MessageTransport>> =
            if assistant.webhook_url.trim().is_empty() {
                None
            } else {
                Some(Arc::new(WebhookClient::new(
                    assistant.webhook_url.clone(),
                    self.config.user.id.clone(),
                    self.config.webhook.request_timeout_secs,
                )?))
            };
        Ok(Outbox::spawn(transport, self.store(), chat_id))
    }

    /// Look up a configured assistant by code, as a domain value.
    pub fn assistant_by_code(&self, code: &str) -> Result<Assistant> {
        self.configured_assistants()
            .into_iter()
            .find(|a| a.code == code)
            .ok_or_else(|| {
                ClientError::Config(format!("no assistant configured with code `{code}`"))
            })
    }
}
