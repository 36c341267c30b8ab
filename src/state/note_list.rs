use super::Diagnostic;
use crate::api::GatewayResult;
use crate::models::{NoteCollection, TitleChange};

/// Label for notes whose title is empty or whitespace.
pub(crate) const UNTITLED_LABEL: &str = "Untitled";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NoteListEntry {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Sidebar view of the user's notes, fed by the live subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NoteListState {
    notes: NoteCollection,
    loaded: bool,
    error: Option<String>,
}

impl NoteListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &NoteCollection {
        &self.notes
    }

    /// False until the first push arrives.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces the collection with a pushed snapshot. A failed push keeps the last good
    /// collection and is reported.
    pub fn apply_push(&mut self, result: GatewayResult<NoteCollection>) -> Option<Diagnostic> {
        match result {
            Ok(notes) => {
                self.notes = notes;
                self.loaded = true;
                self.error = None;
                None
            }
            Err(error) => {
                self.error = Some(error.to_string());
                Some(Diagnostic::ListFailed { error })
            }
        }
    }

    /// Applies a local title edit ahead of the store echoing it back.
    pub fn rename(&mut self, change: &TitleChange) {
        if let Some(note) = self.notes.get_mut(&change.id) {
            note.title = change.title.clone();
        }
    }

    /// Entries in id order.
    pub fn entries(&self, selected: Option<&str>) -> Vec<NoteListEntry> {
        self.notes
            .iter()
            .map(|(id, note)| NoteListEntry {
                id: id.clone(),
                label: if note.title.trim().is_empty() {
                    UNTITLED_LABEL.to_string()
                } else {
                    note.title.clone()
                },
                selected: selected == Some(id.as_str()),
            })
            .collect()
    }
}
