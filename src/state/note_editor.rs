use super::Diagnostic;
use crate::api::GatewayResult;
use crate::models::Note;

/// Shown in the title slot when a note cannot be displayed.
pub(crate) const MISSING_NOTE_TITLE: &str = "Note cannot be found";

/// What the editor currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum NoteView {
    /// No note selected.
    #[default]
    Empty,
    Loading,
    Loaded {
        title: String,
        body: String,
        last_modified: Option<i64>,
    },
    NotFound,
    Error,
}

/// Discriminant of [`NoteView`], for views that should only re-render when the kind changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoteViewKind {
    Empty,
    Loading,
    Loaded,
    Missing,
}

impl NoteView {
    pub fn kind(&self) -> NoteViewKind {
        match self {
            Self::Empty => NoteViewKind::Empty,
            Self::Loading => NoteViewKind::Loading,
            Self::Loaded { .. } => NoteViewKind::Loaded,
            Self::NotFound | Self::Error => NoteViewKind::Missing,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Loaded { title, .. } => title,
            Self::NotFound | Self::Error => MISSING_NOTE_TITLE,
            Self::Empty | Self::Loading => "",
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Loaded { body, .. } => body,
            _ => "",
        }
    }

    pub fn last_modified(&self) -> Option<i64> {
        match self {
            Self::Loaded { last_modified, .. } => *last_modified,
            _ => None,
        }
    }
}

/// Identifies one read issued for a selection. Responses carrying any other token are stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReadToken {
    pub note_id: String,
    seq: u64,
}

/// A full-note write produced by a local edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NoteWrite {
    pub note_id: String,
    pub note: Note,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    Applied,
    /// The response belongs to a selection that has since changed.
    Discarded,
    Reported(Diagnostic),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    /// The selected note is gone; the caller navigates back to the root route.
    Deleted,
    /// Succeeded, but the user already moved on to another note.
    Discarded,
    Failed(Diagnostic),
}

/// Note editor / sync state machine.
///
/// Holds the selected note id and its display state. All remote effects are returned to the
/// caller (read tokens, writes, diagnostics) so the machine itself stays synchronous.
#[derive(Clone, Debug, Default)]
pub(crate) struct NoteEditor {
    note_id: Option<String>,
    seq: u64,
    view: NoteView,
}

impl NoteEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn view(&self) -> &NoteView {
        &self.view
    }

    /// Switches the selection, discarding local state.
    ///
    /// Returns the token of the read the caller must issue, or `None` when nothing is selected.
    pub fn select(&mut self, note_id: Option<String>) -> Option<ReadToken> {
        // Any in-flight read becomes stale, including one for the same id.
        self.seq = self.seq.wrapping_add(1);

        let note_id = note_id.filter(|id| !id.trim().is_empty());
        self.note_id = note_id.clone();

        match note_id {
            None => {
                self.view = NoteView::Empty;
                None
            }
            Some(note_id) => {
                self.view = NoteView::Loading;
                Some(ReadToken {
                    note_id,
                    seq: self.seq,
                })
            }
        }
    }

    pub fn is_current(&self, token: &ReadToken) -> bool {
        token.seq == self.seq && self.note_id.as_deref() == Some(token.note_id.as_str())
    }

    pub fn apply_read(
        &mut self,
        token: &ReadToken,
        result: GatewayResult<Option<Note>>,
    ) -> ReadOutcome {
        if !self.is_current(token) {
            return ReadOutcome::Discarded;
        }

        match result {
            Ok(Some(note)) => {
                self.view = NoteView::Loaded {
                    title: note.title,
                    body: note.body,
                    last_modified: note.last_modified,
                };
                ReadOutcome::Applied
            }
            Ok(None) => {
                self.view = NoteView::NotFound;
                ReadOutcome::Reported(Diagnostic::NoteMissing {
                    note_id: token.note_id.clone(),
                })
            }
            Err(error) => {
                self.view = NoteView::Error;
                ReadOutcome::Reported(Diagnostic::ReadFailed {
                    note_id: token.note_id.clone(),
                    error,
                })
            }
        }
    }

    pub fn edit_title(&mut self, new_title: String, now_ms: i64) -> Option<NoteWrite> {
        self.edit(now_ms, |title, _| *title = new_title)
    }

    pub fn edit_body(&mut self, new_body: String, now_ms: i64) -> Option<NoteWrite> {
        self.edit(now_ms, |_, body| *body = new_body)
    }

    fn edit(&mut self, now_ms: i64, apply: impl FnOnce(&mut String, &mut String)) -> Option<NoteWrite> {
        let note_id = self.note_id.clone()?;
        let NoteView::Loaded {
            title,
            body,
            last_modified,
        } = &mut self.view
        else {
            return None;
        };

        apply(title, body);
        *last_modified = Some(now_ms);

        Some(NoteWrite {
            note_id,
            note: Note {
                title: title.clone(),
                body: body.clone(),
                last_modified: Some(now_ms),
            },
        })
    }

    /// Delete is only offered for a loaded note with some content.
    pub fn can_delete(&self) -> bool {
        matches!(
            &self.view,
            NoteView::Loaded { title, body, .. } if !title.is_empty() || !body.is_empty()
        )
    }

    /// The id to delete, if deleting is currently allowed.
    pub fn begin_delete(&self) -> Option<String> {
        if self.can_delete() {
            self.note_id().map(str::to_string)
        } else {
            None
        }
    }

    pub fn apply_delete(&mut self, note_id: &str, result: GatewayResult<()>) -> DeleteOutcome {
        match result {
            Err(error) => DeleteOutcome::Failed(Diagnostic::DeleteFailed {
                note_id: note_id.to_string(),
                error,
            }),
            Ok(()) if self.note_id.as_deref() == Some(note_id) => {
                self.select(None);
                DeleteOutcome::Deleted
            }
            Ok(()) => DeleteOutcome::Discarded,
        }
    }
}
