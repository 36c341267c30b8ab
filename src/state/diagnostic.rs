use crate::api::GatewayError;
use std::fmt;

/// A failure worth logging, returned by the state machines instead of logged in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Diagnostic {
    /// The store answered, but holds nothing under the id.
    NoteMissing { note_id: String },
    ReadFailed { note_id: String, error: GatewayError },
    ListFailed { error: GatewayError },
    CreateFailed { note_id: String, error: GatewayError },
    UpdateFailed { note_id: String, error: GatewayError },
    DeleteFailed { note_id: String, error: GatewayError },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoteMissing { note_id } => write!(f, "Not able to read note: {note_id}"),
            Self::ReadFailed { note_id, error } => {
                write!(f, "Read note failed: {error} (note {note_id})")
            }
            Self::ListFailed { error } => write!(f, "Read notes failed: {error}"),
            Self::CreateFailed { note_id, error } => {
                write!(f, "Create note failed: {error} (note {note_id})")
            }
            Self::UpdateFailed { note_id, error } => {
                write!(f, "Update note failed: {error} (note {note_id})")
            }
            Self::DeleteFailed { note_id, error } => {
                write!(f, "Delete note failed: {error} (note {note_id})")
            }
        }
    }
}

impl Diagnostic {
    pub fn emit(&self) {
        log::error!("{self}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_failed_reads_log_differently() {
        let missing = Diagnostic::NoteMissing {
            note_id: "noteId".to_string(),
        };
        let failed = Diagnostic::ReadFailed {
            note_id: "noteId".to_string(),
            error: GatewayError::Network("offline".to_string()),
        };
        assert_eq!(missing.to_string(), "Not able to read note: noteId");
        assert!(failed.to_string().starts_with("Read note failed: network error: offline"));
        assert_ne!(missing.to_string(), failed.to_string());
    }
}
