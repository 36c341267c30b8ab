use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single note as stored under `/notes/{uid}/{note_id}`.
///
/// Missing fields decode to empty text; older notes were written without `lastModified`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Note {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(
        rename = "lastModified",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<i64>,
}

/// All notes of one user, keyed by note id.
///
/// Ordered so every listing of the collection is deterministic (ascending note id).
pub(crate) type NoteCollection = BTreeMap<String, Note>;

/// Anonymous user session issued by the identity provider.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct AuthSession {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: String,
    /// When `id_token` stops being accepted (epoch ms). Sessions stored without it count as expired.
    #[serde(default)]
    pub expires_at_ms: i64,
}

/// Title change forwarded from the editor so the list can relabel an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TitleChange {
    pub id: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_contract_deserialize() {
        let json = r#"{"title": "t", "body": "b", "lastModified": 1554907683672}"#;
        let note: Note = serde_json::from_str(json).expect("note should parse");
        assert_eq!(note.title, "t");
        assert_eq!(note.body, "b");
        assert_eq!(note.last_modified, Some(1554907683672));
    }

    #[test]
    fn test_note_missing_fields_default_to_empty() {
        let note: Note = serde_json::from_str("{}").expect("empty object should parse");
        assert_eq!(note, Note::default());
    }

    #[test]
    fn test_note_serialization_uses_camel_case_timestamp() {
        let note = Note {
            title: "untitled".to_string(),
            body: "abc".to_string(),
            last_modified: Some(7),
        };
        let v = serde_json::to_value(&note).expect("should serialize");
        assert_eq!(v["lastModified"], 7);
        assert!(v.get("last_modified").is_none());
    }

    #[test]
    fn test_note_without_timestamp_omits_field() {
        let v = serde_json::to_value(Note::default()).expect("should serialize");
        assert!(v.get("lastModified").is_none());
    }
}
