//! Realtime Database streaming (Server-Sent Events) support.
//!
//! The server sends `put` and `patch` events whose data is `{"path": "/a/b", "data": ...}`.
//! We keep a local JSON copy of the subscribed location and fold each event into it.

use super::{FirebaseClient, GatewayError, GatewayResult};
use crate::models::NoteCollection;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Event names the stream can emit.
pub(crate) const STREAM_EVENTS: [&str; 5] = ["put", "patch", "keep-alive", "cancel", "auth_revoked"];

#[derive(Deserialize, Debug)]
struct StreamPayload {
    path: String,
    #[serde(default)]
    data: Value,
}

/// Folds one stream event into `snapshot`.
///
/// Returns the refreshed collection for data events, an error for `cancel`/`auth_revoked`
/// or malformed payloads, and `None` for events that carry no data.
pub(crate) fn handle_event(
    kind: &str,
    data: &str,
    snapshot: &mut Value,
) -> Option<GatewayResult<NoteCollection>> {
    match kind {
        "put" | "patch" => {
            let payload: StreamPayload = match serde_json::from_str(data) {
                Ok(p) => p,
                Err(e) => return Some(Err(GatewayError::parse(e))),
            };

            if kind == "put" {
                put_at(snapshot, &payload.path, payload.data);
            } else {
                patch_at(snapshot, &payload.path, payload.data);
            }

            Some(Ok(FirebaseClient::parse_note_collection(snapshot)))
        }
        "cancel" => Some(Err(GatewayError::Stream(format!(
            "cancelled by server: {}",
            data.trim_matches('"')
        )))),
        "auth_revoked" => Some(Err(GatewayError::AuthRevoked)),
        _ => None,
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Replaces the value at `path`; `null` removes it.
fn put_at(root: &mut Value, path: &str, data: Value) {
    let segs = segments(path);
    let Some((last, parents)) = segs.split_last() else {
        *root = data;
        return;
    };

    if data.is_null() {
        remove_at(root, parents, last);
        return;
    }

    let mut cur = root;
    for seg in parents {
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        let Value::Object(map) = cur else {
            return;
        };
        cur = map
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !cur.is_object() {
        *cur = Value::Object(Map::new());
    }
    if let Value::Object(map) = cur {
        map.insert(last.to_string(), data);
    }
}

fn remove_at(root: &mut Value, parents: &[&str], last: &str) {
    let mut cur = root;
    for seg in parents {
        match cur.get_mut(*seg) {
            Some(next) => cur = next,
            None => return,
        }
    }
    if let Value::Object(map) = cur {
        map.remove(last);
    }
}

/// Merges the children of `data` into the value at `path`.
fn patch_at(root: &mut Value, path: &str, data: Value) {
    let Value::Object(children) = data else {
        return;
    };

    let base = path.trim_end_matches('/');
    for (key, value) in children {
        put_at(root, &format!("{base}/{key}"), value);
    }
}
