//! Application state store.
//!
//! One [`Store`] instance owns the whole [`AppState`]; mutation goes
//! through [`Store::dispatch`] only, and reducers run synchronously to
//! completion under a single mutex. Components receive the store by
//! `Arc`, not through a global.

pub mod assistants;
pub mod chat_history;
pub mod chats;

use std::sync::Mutex;

pub use assistants::{AssistantsAction, AssistantsState};
pub use chat_history::{ChatHistoryAction, ChatHistoryState, MessageUpdate};
pub use chats::{ChatsAction, ChatsState};

/// The full client-side application state.
#[derive(Debug, Default)]
pub struct AppState {
    pub assistants: AssistantsState,
    pub chats: ChatsState,
    pub chat_history: ChatHistoryState,
}

/// A state mutation, routed to the owning slice.
#[derive(Debug)]
pub enum Action {
    Assistants(AssistantsAction),
    Chats(ChatsAction),
    ChatHistory(ChatHistoryAction),
}

/// Owner of [`AppState`]. Cheap to share via `Arc`.
#[derive(Debug, Default)]
pub struct Store {
    state: Mutex<AppState>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an action to the state. Reducers never fail; unknown ids
    /// are ignored the way the UI expects (stale updates are dropped).
    pub fn dispatch(&self, action: Action) {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(p) => p.into_inner(),
        };
        match action {
            Action::Assistants(action) => state.assistants.reduce(action),
            Action::Chats(action) => state.chats.reduce(action),
            Action::ChatHistory(action) => state.chat_history.reduce(action),
        }
    }

    /// Read the state through a selector closure.
    pub fn select<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = match self.state.lock() {
            Ok(s) => s,
            Err(p) => p.into_inner(),
        };
        f(&state)
    }
}
