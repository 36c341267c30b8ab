use crate::models::AuthSession;
use serde::{Deserialize, Serialize};

/// Anonymous session, so a reload keeps the same user (and therefore the same notes).
pub(crate) const SESSION_KEY: &str = "scribble_session";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn load_session() -> Option<AuthSession> {
    load_json_from_storage::<AuthSession>(SESSION_KEY)
        .filter(|s| !s.uid.trim().is_empty() && !s.refresh_token.trim().is_empty())
}

pub(crate) fn save_session(session: &AuthSession) {
    save_json_to_storage(SESSION_KEY, session);
}

pub(crate) fn clear_session() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(SESSION_KEY);
    }
}


// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_storage_roundtrip() {
        clear_session();
        assert!(load_session().is_none());

        let session = AuthSession {
            uid: "anon".to_string(),
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at_ms: 1_000,
        };
        save_session(&session);
        assert_eq!(load_session(), Some(session));

        clear_session();
        assert!(load_session().is_none());
    }

    #[wasm_bindgen_test]
    fn test_blank_session_is_ignored() {
        save_session(&AuthSession {
            uid: " ".to_string(),
            id_token: String::new(),
            refresh_token: String::new(),
            expires_at_ms: 0,
        });
        assert!(load_session().is_none());
        clear_session();
    }
}
