pub(crate) mod auth;
pub(crate) mod firebase;
pub(crate) mod stream;

use crate::models::{Note, NoteCollection};
use futures::future::LocalBoxFuture;
use std::sync::Arc;
use thiserror::Error;

pub(crate) use auth::AuthClient;
pub(crate) use firebase::{FirebaseClient, IdToken, UnauthorizedHook};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request failed ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("live updates failed: {0}")]
    Stream(String),
    #[error("live updates failed: credential expired or revoked")]
    AuthRevoked,
}

impl GatewayError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    /// True when the store refused the id token, so a refreshed one may succeed.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. } | Self::AuthRevoked)
    }
}

pub(crate) type GatewayResult<T> = Result<T, GatewayError>;

/// Futures are driven by `spawn_local` on the browser event loop.
pub(crate) type GatewayFuture<T> = LocalBoxFuture<'static, GatewayResult<T>>;

pub(crate) type PushCallback = Box<dyn Fn(GatewayResult<NoteCollection>)>;

/// Remote note store, keyed by `(uid, note_id)`.
pub(crate) trait NoteGateway {
    /// Resolves to `None` when nothing is stored under the id.
    fn read_once(&self, uid: &str, note_id: &str) -> GatewayFuture<Option<Note>>;

    /// `on_push` fires with the whole collection on the initial load and on every change
    /// until the returned [`Subscription`] is dropped.
    fn subscribe_all(&self, uid: &str, on_push: PushCallback) -> Subscription;

    fn create(&self, uid: &str, note_id: &str, note: &Note) -> GatewayFuture<()>;

    fn update(&self, uid: &str, note_id: &str, note: &Note) -> GatewayFuture<()>;

    fn delete(&self, uid: &str, note_id: &str) -> GatewayFuture<()>;
}

pub(crate) type SharedGateway = Arc<dyn NoteGateway + Send + Sync>;

/// Live subscription handle. Dropping it releases the underlying stream.
pub(crate) struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release (the stream never opened).
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
