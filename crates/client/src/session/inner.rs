//! Shared session state behind the store handle.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use fitwear_core::AccessToken;

use super::SessionStatus;
use crate::api::CredentialSource;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::User;
use crate::navigation::{Navigator, Route, split_location};
use crate::storage::{Storage, keys, load_json, save_json};

/// A signed-in session: user and credential, always together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Session {
    pub access_token: AccessToken,
    pub user: User,
}

#[derive(Default)]
struct SessionState {
    current: Option<Session>,
    /// Bumped whenever `current` is replaced or cleared.
    generation: u64,
}

pub(super) struct SessionInner {
    state: RwLock<SessionState>,
    storage: Arc<dyn Storage>,
    navigator: Navigator,
    pub(super) status: watch::Sender<SessionStatus>,
    pub(super) rehydrate_started: AtomicBool,
}

impl SessionInner {
    pub(super) fn new(storage: Arc<dyn Storage>, navigator: Navigator) -> Self {
        let (status, _) = watch::channel(SessionStatus::Loading);
        Self {
            state: RwLock::new(SessionState::default()),
            storage,
            navigator,
            status,
            rehydrate_started: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn user(&self) -> Option<User> {
        self.read().current.as_ref().map(|s| s.user.clone())
    }

    pub(super) fn generation(&self) -> u64 {
        self.read().generation
    }

    pub(super) fn load_persisted(&self) -> Option<Session> {
        load_json::<Session>(self.storage.as_ref(), keys::SESSION)
            .filter(|session| !session.access_token.is_empty())
    }

    /// Make `session` current and persist it. Returns its generation.
    pub(super) fn establish(&self, session: Session) -> u64 {
        set_sentry_user(&session.user.id, Some(session.user.email.as_str()));

        let mut state = self.write();
        self.persist(Some(&session));
        state.current = Some(session);
        state.generation += 1;
        state.generation
    }

    /// Swap in a fresh user record if `generation` is still current.
    pub(super) fn replace_user(&self, generation: u64, user: User) -> bool {
        let mut state = self.write();
        if state.generation != generation {
            return false;
        }
        let Some(current) = state.current.as_mut() else {
            return false;
        };
        current.user = user;
        let snapshot = current.clone();
        self.persist(Some(&snapshot));
        true
    }

    /// Drop the session unconditionally.
    pub(super) fn clear(&self) {
        let mut state = self.write();
        state.current = None;
        state.generation += 1;
        self.persist(None);
        drop(state);
        clear_sentry_user();
    }

    /// Drop the session only if it is still the one from `generation`.
    pub(super) fn clear_if_current(&self, generation: u64) -> bool {
        let mut state = self.write();
        if state.generation != generation || state.current.is_none() {
            return false;
        }
        state.current = None;
        state.generation += 1;
        self.persist(None);
        drop(state);
        clear_sentry_user();
        true
    }

    /// Write-through to durable storage. Called with the state lock held so
    /// writes land in the same order as the state changes.
    fn persist(&self, session: Option<&Session>) {
        let result = match session {
            Some(session) => save_json(self.storage.as_ref(), keys::SESSION, session),
            None => self.storage.remove(keys::SESSION),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

impl CredentialSource for SessionInner {
    fn current_credential(&self) -> Option<(AccessToken, u64)> {
        let state = self.read();
        state
            .current
            .as_ref()
            .map(|s| (s.access_token.clone(), state.generation))
    }

    fn credential_rejected(&self, generation: u64) {
        if !self.clear_if_current(generation) {
            return;
        }
        info!("Session expired, sign-in required");

        let here = self.navigator.current();
        let (path, _) = split_location(&here);
        if Route::parse(path) != Some(Route::Login) {
            self.navigator.redirect_to_login(&here);
        }
    }
}
