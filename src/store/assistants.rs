//! Assistants slice: configured personas and the active selection.

use crate::model::Assistant;

/// Mutations on the assistants slice.
#[derive(Debug)]
pub enum AssistantsAction {
    Set(Vec<Assistant>),
    Select(String),
    ToggleStar(String),
}

/// Available assistants and the currently selected one.
#[derive(Debug, Default)]
pub struct AssistantsState {
    pub list: Vec<Assistant>,
    pub selected_assistant_id: Option<String>,
}

impl AssistantsState {
    pub fn reduce(&mut self, action: AssistantsAction) {
        match action {
            AssistantsAction::Set(list) => {
                // Selection survives a refresh only if the assistant still exists.
                if let Some(selected) = &self.selected_assistant_id {
                    if !list.iter().any(|a| &a.id == selected) {
                        self.selected_assistant_id = None;
                    }
                }
                self.list = list;
            }
            AssistantsAction::Select(id) => {
                self.selected_assistant_id = Some(id);
            }
            AssistantsAction::ToggleStar(id) => {
                let next_order = self
                    .list
                    .iter()
                    .filter_map(|a| a.star_order)
                    .max()
                    .map_or(1, |max| max + 1);
                if let Some(assistant) = self.list.iter_mut().find(|a| a.id == id) {
                    if assistant.is_starred {
                        assistant.is_starred = false;
                        assistant.star_order = None;
                    } else {
                        assistant.is_starred = true;
                        assistant.star_order = Some(next_order);
                    }
                }
            }
        }
    }

    /// The currently selected assistant, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Assistant> {
        let id = self.selected_assistant_id.as_deref()?;
        self.list.iter().find(|a| a.id == id)
    }
}
