use crate::models::NoteCollection;

/// Viewports narrower than this show either the list or the editor, never both.
pub(crate) const SMALL_WIDTH: i32 = 600;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum DeviceWidth {
    Small,
    NotSmall,
}

pub(crate) fn classify(width: i32) -> DeviceWidth {
    if width < SMALL_WIDTH {
        DeviceWidth::Small
    } else {
        DeviceWidth::NotSmall
    }
}

/// What the shell mounts for a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Layout {
    /// Create button and list only.
    SidebarOnly,
    /// Editor only; title edits are not forwarded to a list.
    EditorOnly,
    /// List next to the editor.
    SidebarAndEditor,
}

pub(crate) fn select_layout(width: DeviceWidth, note_selected: bool) -> Layout {
    match (width, note_selected) {
        (DeviceWidth::Small, false) => Layout::SidebarOnly,
        (DeviceWidth::Small, true) => Layout::EditorOnly,
        (DeviceWidth::NotSmall, _) => Layout::SidebarAndEditor,
    }
}

/// Redirect target for the root path when redirect-to-first-note is enabled.
///
/// The collection is keyed by id, so this is the lexicographically smallest id.
pub(crate) fn first_note_id(notes: &NoteCollection) -> Option<String> {
    notes.keys().next().cloned()
}
