mod diagnostic;
pub(crate) mod note_editor;
pub(crate) mod note_list;
pub(crate) mod note_sync;
mod session;

pub(crate) use diagnostic::Diagnostic;
pub(crate) use note_editor::NoteViewKind;
pub(crate) use note_list::NoteListState;
pub(crate) use note_sync::NoteSyncController;
pub(crate) use session::SessionRefresher;

use crate::config::EnvConfig;
use crate::models::AuthSession;
use leptos::prelude::*;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum AuthState {
    /// Sign-in has not finished yet.
    #[default]
    Unauthenticated,
    Authenticated(AuthSession),
    /// Sign-in failed; the user has been asked to reload.
    Failed,
}

/// What the UI shows for an [`AuthState`]; token refreshes keep the phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AuthPhase {
    Pending,
    Ready,
    Failed,
}

impl AuthState {
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn phase(&self) -> AuthPhase {
        match self {
            Self::Unauthenticated => AuthPhase::Pending,
            Self::Authenticated(_) => AuthPhase::Ready,
            Self::Failed => AuthPhase::Failed,
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: EnvConfig,
    pub auth: RwSignal<AuthState>,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            config,
            auth: RwSignal::new(AuthState::default()),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
