use super::AuthState;
use crate::api::{AuthClient, IdToken};
use crate::models::AuthSession;
use crate::storage::save_session;
use crate::util::now_ms;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

/// Refresh this long before the id token runs out.
pub(crate) const REFRESH_MARGIN_MS: i64 = 5 * 60 * 1000;
/// Wait after a failed refresh before trying again.
pub(crate) const RETRY_DELAY_MS: i64 = 60 * 1000;

pub(crate) fn refresh_delay_ms(session: &AuthSession, now: i64) -> i64 {
    (session.expires_at_ms - REFRESH_MARGIN_MS - now).max(0)
}

/// A refused token only triggers a refresh while it is still the current one.
fn should_refresh(refused: &str, current: &str) -> bool {
    !refused.is_empty() && refused == current
}

/// Keeps the signed-in session's id token fresh.
///
/// A timer refreshes shortly before expiry, and [`SessionRefresher::expired`] refreshes as
/// soon as the store refuses the current token. A new token is written to the shared
/// [`IdToken`] first, then persisted and published through `auth`.
#[derive(Clone)]
pub(crate) struct SessionRefresher {
    auth: RwSignal<AuthState>,
    client: AuthClient,
    id_token: IdToken,
    in_flight: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    timer: Arc<Mutex<Option<i32>>>,
}

impl SessionRefresher {
    pub fn new(auth: RwSignal<AuthState>, client: AuthClient, id_token: IdToken) -> Self {
        Self {
            auth,
            client,
            id_token,
            in_flight: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            timer: Arc::new(Mutex::new(None)),
        }
    }

    /// Schedules the first refresh. The timer is cancelled when the current owner is disposed.
    pub fn start(&self) {
        let delay = self
            .auth
            .with_untracked(|a| a.session().map(|s| refresh_delay_ms(s, now_ms())));
        if let Some(delay) = delay {
            self.schedule(delay);
        }

        let s = self.clone();
        on_cleanup(move || s.stop());
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.cancel_timer();
    }

    /// The store refused `token`.
    pub fn expired(&self, token: &str) {
        if should_refresh(token, &self.id_token.get()) {
            self.refresh_now();
        }
    }

    fn cancel_timer(&self) {
        let Ok(mut timer) = self.timer.lock() else {
            return;
        };
        if let (Some(tid), Some(win)) = (timer.take(), web_sys::window()) {
            win.clear_timeout_with_handle(tid);
        }
    }

    fn schedule(&self, delay_ms: i64) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let Some(win) = web_sys::window() else {
            return;
        };
        self.cancel_timer();

        let s = self.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || s.refresh_now());
        let delay = delay_ms.clamp(0, i64::from(i32::MAX)) as i32;
        match win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), delay) {
            Ok(tid) => {
                if let Ok(mut timer) = self.timer.lock() {
                    *timer = Some(tid);
                }
                log::debug!("id token refresh in {}s", delay / 1000);
            }
            Err(e) => log::warn!("could not schedule token refresh: {e:?}"),
        }
    }

    fn refresh_now(&self) {
        if self.stopped.load(Ordering::SeqCst) || self.in_flight.swap(true, Ordering::SeqCst) {
            return;
        }
        let refresh_token = self
            .auth
            .try_with_untracked(|a| a.session().map(|s| s.refresh_token.clone()))
            .flatten();
        let Some(refresh_token) = refresh_token else {
            self.in_flight.store(false, Ordering::SeqCst);
            return;
        };

        let s = self.clone();
        spawn_local(async move {
            let next = match s.client.refresh(&refresh_token).await {
                Ok(session) => {
                    s.id_token.set(session.id_token.clone());
                    save_session(&session);
                    let delay = refresh_delay_ms(&session, now_ms());
                    s.auth.try_set(AuthState::Authenticated(session));
                    log::info!("id token refreshed");
                    delay
                }
                Err(e) => {
                    log::warn!("token refresh failed: {e}");
                    RETRY_DELAY_MS
                }
            };
            s.in_flight.store(false, Ordering::SeqCst);
            s.schedule(next);
        });
    }
}
