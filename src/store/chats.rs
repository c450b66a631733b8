//! Chats slice: the chat list, selection, unread counts, stars.

use std::collections::HashMap;

use chrono::{Duration, Utc};

use crate::model::Chat;

/// Each id step below the maximum counts as roughly this long ago when
/// the backend omits timestamps.
const ESTIMATED_MINUTES_PER_ID: i64 = 30;

/// Mutations on the chats slice.
#[derive(Debug)]
pub enum ChatsAction {
    /// Replace the list from a backend refresh. Existing client-side
    /// timestamps are preserved; chats without any timestamp get an
    /// id-based estimate.
    Set(Vec<Chat>),
    /// Append a newly created chat, stamping missing timestamps.
    Push(Chat),
    Remove(String),
    Select(String),
    UpdateUnread { id: String, unread: u32 },
    UpdateTitle { id: String, title: String },
    ToggleStar(String),
}

/// The user's chats across all assistants.
#[derive(Debug, Default)]
pub struct ChatsState {
    pub list: Vec<Chat>,
    pub selected_chat_id: Option<String>,
}

impl ChatsState {
    pub fn reduce(&mut self, action: ChatsAction) {
        match action {
            ChatsAction::Set(incoming) => self.set_chats(incoming),
            ChatsAction::Push(mut chat) => {
                let now = Utc::now();
                chat.created_at.get_or_insert(now);
                chat.last_message_date.get_or_insert(now);
                self.list.push(chat);
            }
            ChatsAction::Remove(id) => {
                self.list.retain(|c| c.id != id);
                if self.selected_chat_id.as_deref() == Some(id.as_str()) {
                    self.selected_chat_id = None;
                }
            }
            ChatsAction::Select(id) => {
                self.selected_chat_id = Some(id);
            }
            ChatsAction::UpdateUnread { id, unread } => {
                if let Some(chat) = self.list.iter_mut().find(|c| c.id == id) {
                    chat.unread = unread;
                }
            }
            ChatsAction::UpdateTitle { id, title } => {
                if let Some(chat) = self.list.iter_mut().find(|c| c.id == id) {
                    chat.title = title;
                }
            }
            ChatsAction::ToggleStar(id) => {
                let next_order = self
                    .list
                    .iter()
                    .filter_map(|c| c.star_order)
                    .max()
                    .map_or(1, |max| max + 1);
                if let Some(chat) = self.list.iter_mut().find(|c| c.id == id) {
                    if chat.is_starred {
                        chat.is_starred = false;
                        chat.star_order = None;
                    } else {
                        chat.is_starred = true;
                        chat.star_order = Some(next_order);
                    }
                }
            }
        }
    }

    /// Refresh the list while keeping timestamps the backend does not
    /// return. Chats with neither server nor client timestamps get an
    /// estimate from their numeric id: higher id means more recent, one
    /// id step is ~30 minutes.
    fn set_chats(&mut self, incoming: Vec<Chat>) {
        let existing: HashMap<String, Chat> =
            self.list.drain(..).map(|c| (c.id.clone(), c)).collect();

        let max_id = incoming
            .iter()
            .filter_map(|c| c.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        let now = Utc::now();

        self.list = incoming
            .into_iter()
            .map(|mut chat| {
                if let Some(previous) = existing.get(&chat.id) {
                    chat.is_starred = previous.is_starred;
                    chat.star_order = previous.star_order;
                    if chat.created_at.is_none() {
                        chat.created_at = previous.created_at;
                    }
                    if chat.last_message_date.is_none() {
                        chat.last_message_date = previous.last_message_date;
                    }
                }
                if chat.created_at.is_none() && chat.last_message_date.is_none() {
                    if let Ok(numeric_id) = chat.id.parse::<i64>() {
                        if max_id > 0 {
                            let id_diff = max_id - numeric_id;
                            let estimated =
                                now - Duration::minutes(id_diff * ESTIMATED_MINUTES_PER_ID);
                            chat.created_at = Some(estimated);
                            chat.last_message_date = Some(estimated);
                        }
                    }
                }
                chat
            })
            .collect();
    }

    /// The chat with the given id, if present.
    #[must_use]
    pub fn chat(&self, id: &str) -> Option<&Chat> {
        self.list.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn chat(id: &str) -> Chat {
        Chat {
            id: id.to_owned(),
            assistant_id: "a1".to_owned(),
            title: format!("chat {id}"),
            unread: 0,
            is_starred: false,
            star_order: None,
            created_at: None,
            last_message_date: None,
        }
    }

    #[test]
    fn set_estimates_missing_timestamps_from_ids() {
        let mut state = ChatsState::default();
        state.reduce(ChatsAction::Set(vec![chat("1"), chat("2"), chat("3")]));

        let dates: Vec<_> = state
            .list
            .iter()
            .map(|c| c.created_at.expect("estimated"))
            .collect();
        // Higher id = more recent.
        assert!(dates[0] < dates[1]);
        assert!(dates[1] < dates[2]);
        // Newest estimate lands at ~now.
        assert!((Utc::now() - dates[2]).num_seconds() < 5);
        // One id step apart = 30 minutes apart.
        assert_eq!((dates[2] - dates[1]).num_minutes(), 30);
    }

    #[test]
    fn set_preserves_existing_timestamps_and_stars() {
        let mut state = ChatsState::default();
        state.reduce(ChatsAction::Set(vec![chat("1"), chat("2")]));
        state.reduce(ChatsAction::ToggleStar("1".to_owned()));
        let first_estimate = state.chat("1").unwrap().created_at;

        // Backend refresh still has no timestamps.
        state.reduce(ChatsAction::Set(vec![chat("1"), chat("2")]));

        let refreshed = state.chat("1").unwrap();
        assert_eq!(refreshed.created_at, first_estimate);
        assert!(refreshed.is_starred);
        assert_eq!(refreshed.star_order, Some(1));
    }

    #[test]
    fn non_numeric_ids_get_no_estimate() {
        let mut state = ChatsState::default();
        state.reduce(ChatsAction::Set(vec![chat("abc-uuid")]));
        assert!(state.chat("abc-uuid").unwrap().created_at.is_none());
    }

    #[test]
    fn push_stamps_timestamps() {
        let mut state = ChatsState::default();
        state.reduce(ChatsAction::Push(chat("9")));
        let pushed = state.chat("9").unwrap();
        assert!(pushed.created_at.is_some());
        assert!(pushed.last_message_date.is_some());
    }

    #[test]
    fn remove_clears_selection() {
        let mut state = ChatsState::default();
        state.reduce(ChatsAction::Push(chat("1")));
        state.reduce(ChatsAction::Select("1".to_owned()));
        state.reduce(ChatsAction::Remove("1".to_owned()));
        assert!(state.selected_chat_id.is_none());
        assert!(state.list.is_empty());
    }

    #[test]
    fn star_order_increments() {
        let mut state = ChatsState::default();
        state.reduce(ChatsAction::Push(chat("1")));
        state.reduce(ChatsAction::Push(chat("2")));
        state.reduce(ChatsAction::ToggleStar("1".to_owned()));
        state.reduce(ChatsAction::ToggleStar("2".to_owned()));
        assert_eq!(state.chat("1").unwrap().star_order, Some(1));
        assert_eq!(state.chat("2").unwrap().star_order, Some(2));

        state.reduce(ChatsAction::ToggleStar("1".to_owned()));
        assert_eq!(state.chat("1").unwrap().star_order, None);
    }

    #[test]
    fn unread_and_title_updates() {
        let mut state = ChatsState::default();
        state.reduce(ChatsAction::Push(chat("1")));
        state.reduce(ChatsAction::UpdateUnread {
            id: "1".to_owned(),
            unread: 4,
        });
        state.reduce(ChatsAction::UpdateTitle {
            id: "1".to_owned(),
            title: "Renamed".to_owned(),
        });
        let updated = state.chat("1").unwrap();
        assert_eq!(updated.unread, 4);
        assert_eq!(updated.title, "Renamed");
    }
}
