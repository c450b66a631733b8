//! Chat history slice: the messages of the currently open chat.

use chrono::{DateTime, Utc};

use crate::model::{ChatHistory, MessageStatus};

/// Partial update applied to an existing message.
#[derive(Debug, Default, Clone)]
pub struct MessageUpdate {
    pub status: Option<MessageStatus>,
    pub sent_date: Option<DateTime<Utc>>,
    pub text: Option<String>,
}

/// Mutations on the chat history slice.
#[derive(Debug)]
pub enum ChatHistoryAction {
    /// Replace the whole history (chat switch).
    Set(Vec<ChatHistory>),
    /// Append a message.
    Add(ChatHistory),
    /// Apply a partial update to the message with the given id.
    Update { id: String, updates: MessageUpdate },
    /// Set only the delivery status of the message with the given id.
    UpdateStatus { id: String, status: MessageStatus },
    /// Remove a message by id.
    Remove(String),
    /// Drop all messages (chat switch/logout).
    Clear,
}

/// Messages of the active chat, in display order.
#[derive(Debug, Default)]
pub struct ChatHistoryState {
    pub list: Vec<ChatHistory>,
    pub last_message_id: Option<String>,
}

impl ChatHistoryState {
    pub fn reduce(&mut self, action: ChatHistoryAction) {
        match action {
            ChatHistoryAction::Set(list) => {
                self.last_message_id = list.last().map(|m| m.id.clone());
                self.list = list;
            }
            ChatHistoryAction::Add(message) => {
                self.last_message_id = Some(message.id.clone());
                self.list.push(message);
            }
            ChatHistoryAction::Update { id, updates } => {
                if let Some(message) = self.list.iter_mut().find(|m| m.id == id) {
                    if let Some(status) = updates.status {
                        message.status = Some(status);
                    }
                    if let Some(sent_date) = updates.sent_date {
                        message.sent_date = sent_date;
                    }
                    if let Some(text) = updates.text {
                        message.text = text;
                    }
                }
            }
            ChatHistoryAction::UpdateStatus { id, status } => {
                if let Some(message) = self.list.iter_mut().find(|m| m.id == id) {
                    message.status = Some(status);
                }
            }
            ChatHistoryAction::Remove(id) => {
                self.list.retain(|m| m.id != id);
            }
            ChatHistoryAction::Clear => {
                self.list.clear();
                self.last_message_id = None;
            }
        }
    }

    /// The message with the given id, if present.
    #[must_use]
    pub fn message(&self, id: &str) -> Option<&ChatHistory> {
        self.list.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn message(id: &str) -> ChatHistory {
        let mut msg =
            ChatHistory::optimistic("c1", "text", Vec::new(), None, MessageStatus::Queued);
        msg.id = id.to_owned();
        msg
    }

    #[test]
    fn add_tracks_last_message_id() {
        let mut state = ChatHistoryState::default();
        state.reduce(ChatHistoryAction::Add(message("m1")));
        state.reduce(ChatHistoryAction::Add(message("m2")));
        assert_eq!(state.last_message_id.as_deref(), Some("m2"));
        assert_eq!(state.list.len(), 2);
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut state = ChatHistoryState::default();
        state.reduce(ChatHistoryAction::Add(message("m1")));
        let original_date = state.message("m1").unwrap().sent_date;

        state.reduce(ChatHistoryAction::Update {
            id: "m1".to_owned(),
            updates: MessageUpdate {
                status: Some(MessageStatus::Sending),
                ..Default::default()
            },
        });

        let msg = state.message("m1").unwrap();
        assert_eq!(msg.status, Some(MessageStatus::Sending));
        assert_eq!(msg.sent_date, original_date);
        assert_eq!(msg.text, "text");
    }

    #[test]
    fn update_unknown_id_is_ignored() {
        let mut state = ChatHistoryState::default();
        state.reduce(ChatHistoryAction::UpdateStatus {
            id: "ghost".to_owned(),
            status: MessageStatus::Sent,
        });
        assert!(state.list.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut state = ChatHistoryState::default();
        state.reduce(ChatHistoryAction::Add(message("m1")));
        state.reduce(ChatHistoryAction::Add(message("m2")));

        state.reduce(ChatHistoryAction::Remove("m1".to_owned()));
        assert_eq!(state.list.len(), 1);

        state.reduce(ChatHistoryAction::Clear);
        assert!(state.list.is_empty());
        assert!(state.last_message_id.is_none());
    }
}
