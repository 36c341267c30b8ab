use super::stream::{handle_event, STREAM_EVENTS};
use super::{GatewayError, GatewayFuture, GatewayResult, NoteGateway, PushCallback, Subscription};
use crate::models::{Note, NoteCollection};
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, RwLock};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// The session's current id token. Clones share one cell, so a refresh reaches every holder.
#[derive(Clone, Default, Debug)]
pub(crate) struct IdToken(Arc<RwLock<String>>);

impl IdToken {
    pub fn new(token: String) -> Self {
        Self(Arc::new(RwLock::new(token)))
    }

    pub fn get(&self) -> String {
        self.0.read().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn set(&self, token: String) {
        if let Ok(mut t) = self.0.write() {
            *t = token;
        }
    }
}

/// Told which token the store refused.
pub(crate) type UnauthorizedHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Remembers the token a request went out with.
#[derive(Clone)]
struct TokenGuard {
    token: String,
    hook: Option<UnauthorizedHook>,
}

impl TokenGuard {
    fn check(&self, e: &GatewayError) {
        if !e.is_unauthorized() {
            return;
        }
        log::warn!("store refused the id token: {e}");
        if let Some(hook) = &self.hook {
            hook(&self.token);
        }
    }
}

/// Realtime Database REST client scoped to one signed-in session.
///
/// Notes live at `/notes/{uid}/{note_id}`.
#[derive(Clone)]
pub(crate) struct FirebaseClient {
    pub(crate) database_url: String,
    pub(crate) id_token: IdToken,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl FirebaseClient {
    pub fn new(database_url: String, id_token: IdToken) -> Self {
        Self {
            database_url,
            id_token,
            on_unauthorized: None,
        }
    }

    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    fn guard(&self) -> TokenGuard {
        TokenGuard {
            token: self.id_token.get(),
            hook: self.on_unauthorized.clone(),
        }
    }

    fn location_url(&self, path: &[&str]) -> String {
        let path = path
            .iter()
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}.json?auth={}",
            self.database_url,
            path,
            urlencoding::encode(&self.id_token.get())
        )
    }

    pub(crate) fn notes_url(&self, uid: &str) -> String {
        self.location_url(&["notes", uid])
    }

    pub(crate) fn note_url(&self, uid: &str, note_id: &str) -> String {
        self.location_url(&["notes", uid, note_id])
    }

    async fn send(req: reqwest::RequestBuilder) -> GatewayResult<reqwest::Response> {
        let res = req.send().await.map_err(GatewayError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(GatewayError::Http { status, body })
        }
    }

    fn write(&self, req: reqwest::RequestBuilder) -> GatewayFuture<()> {
        let guard = self.guard();
        async move {
            Self::send(req)
                .await
                .map(|_| ())
                .inspect_err(|e| guard.check(e))
        }
        .boxed_local()
    }

    pub(crate) fn parse_note(data: serde_json::Value) -> GatewayResult<Option<Note>> {
        if data.is_null() {
            return Ok(None);
        }
        serde_json::from_value(data).map(Some).map_err(GatewayError::parse)
    }

    /// Decodes a user's notes location. Children that are not note objects are skipped.
    pub(crate) fn parse_note_collection(data: &serde_json::Value) -> NoteCollection {
        let Some(children) = data.as_object() else {
            return NoteCollection::new();
        };

        children
            .iter()
            .filter(|(id, _)| !id.trim().is_empty())
            .filter_map(|(id, v)| {
                serde_json::from_value::<Note>(v.clone())
                    .ok()
                    .map(|note| (id.clone(), note))
            })
            .collect()
    }
}

impl NoteGateway for FirebaseClient {
    fn read_once(&self, uid: &str, note_id: &str) -> GatewayFuture<Option<Note>> {
        let guard = self.guard();
        let req = reqwest::Client::new().get(self.note_url(uid, note_id));
        async move {
            let res = Self::send(req).await.inspect_err(|e| guard.check(e))?;
            let data: serde_json::Value = res.json().await.map_err(GatewayError::parse)?;
            Self::parse_note(data)
        }
        .boxed_local()
    }

    fn subscribe_all(&self, uid: &str, on_push: PushCallback) -> Subscription {
        let url = self.notes_url(uid);
        let source = match web_sys::EventSource::new(&url) {
            Ok(source) => source,
            Err(e) => {
                on_push(Err(GatewayError::Stream(format!("{e:?}"))));
                return Subscription::detached();
            }
        };

        let guard = self.guard();
        let on_push: Rc<dyn Fn(GatewayResult<NoteCollection>)> = Rc::from(on_push);
        let snapshot = Rc::new(RefCell::new(serde_json::Value::Null));

        let mut listeners: Vec<(&'static str, Closure<dyn FnMut(web_sys::MessageEvent)>)> =
            Vec::with_capacity(STREAM_EVENTS.len());
        for kind in STREAM_EVENTS {
            let on_push = on_push.clone();
            let snapshot = snapshot.clone();
            let guard = guard.clone();
            let cb = Closure::wrap(Box::new(move |ev: web_sys::MessageEvent| {
                let data = ev.data().as_string().unwrap_or_default();
                let pushed = handle_event(kind, &data, &mut snapshot.borrow_mut());
                if let Some(result) = pushed {
                    if let Err(e) = &result {
                        guard.check(e);
                    }
                    on_push(result);
                }
            }) as Box<dyn FnMut(web_sys::MessageEvent)>);

            if let Err(e) = source.add_event_listener_with_callback(kind, cb.as_ref().unchecked_ref()) {
                log::warn!("could not listen for '{kind}' events: {e:?}");
            }
            listeners.push((kind, cb));
        }

        // The browser reconnects on its own; report the outage so the list can show it.
        let on_error = {
            let on_push = on_push.clone();
            Closure::wrap(Box::new(move |_ev: web_sys::Event| {
                on_push(Err(GatewayError::Stream("connection lost".to_string())));
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        log::debug!("subscribed to notes of {uid}");

        Subscription::new(move || {
            source.close();
            source.set_onerror(None);
            for (kind, cb) in listeners.iter() {
                if let Err(e) = source.remove_event_listener_with_callback(kind, cb.as_ref().unchecked_ref()) {
                    log::warn!("could not remove '{kind}' listener: {e:?}");
                }
            }
            drop(listeners);
            drop(on_error);
        })
    }

    fn create(&self, uid: &str, note_id: &str, note: &Note) -> GatewayFuture<()> {
        let req = reqwest::Client::new()
            .put(self.note_url(uid, note_id))
            .json(note);
        self.write(req)
    }

    fn update(&self, uid: &str, note_id: &str, note: &Note) -> GatewayFuture<()> {
        let req = reqwest::Client::new()
            .patch(self.note_url(uid, note_id))
            .json(note);
        self.write(req)
    }

    fn delete(&self, uid: &str, note_id: &str) -> GatewayFuture<()> {
        let req = reqwest::Client::new().delete(self.note_url(uid, note_id));
        self.write(req)
    }
}
