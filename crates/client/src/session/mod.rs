//! Session store: who is signed in and what they may do.
//!
//! Holds the current user and bearer credential, persists both under
//! [`keys::SESSION`](crate::storage::keys::SESSION), and answers role
//! queries against the ranking in [`Role`].
//!
//! # Generations
//!
//! Every login, logout or forced sign-out bumps a generation counter. Async
//! operations capture the generation when they start and only apply their
//! result if it is unchanged when the response arrives, so a late answer for
//! a previous session never lands on its successor.
//!
//! # Startup
//!
//! The store starts in [`SessionStatus::Loading`]. [`SessionStore::rehydrate`]
//! restores the persisted session, re-validates it with the API, and then
//! flips the status to [`SessionStatus::Ready`]. Route decisions made before
//! that are [`Pending`](crate::navigation::GuardDecision::Pending).

mod inner;

pub(crate) use inner::Session;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use fitwear_core::Role;

use self::inner::SessionInner;
use crate::api::{ApiClient, ApiError};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::models::{Credentials, PasswordChange, ProfileUpdate, Registration, User};
use crate::navigation::Navigator;
use crate::storage::Storage;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const PROFILE_UPDATE_FAILED: &str = "Profile update failed";
const PASSWORD_CHANGE_FAILED: &str = "Password change failed";
const SIGN_IN_REQUIRED: &str = "Please sign in to continue";

/// Whether the startup session check has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Rehydration has not completed; authorization answers are not final.
    Loading,
    /// The session (or its absence) is settled.
    Ready,
}

/// Handle to the session store.
///
/// Cheap to clone; clones share state. Owns the [`ApiClient`], which reads
/// the credential from this store for every request.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
    api: ApiClient,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &self.status())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create the store and the API client bound to it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        storage: Arc<dyn Storage>,
        navigator: Navigator,
    ) -> std::result::Result<Self, ApiError> {
        let inner = Arc::new(SessionInner::new(storage, navigator));
        let api = ApiClient::new(config, inner.clone())?;
        Ok(Self { inner, api })
    }

    /// The API client carrying this session's credential.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    /// Receive status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Resolve once the startup check has finished.
    pub async fn wait_until_ready(&self) {
        let mut status = self.subscribe_status();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = status.wait_for(|s| *s == SessionStatus::Ready).await;
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.user()
    }

    /// The signed-in user's role, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.current_user().map(|u| u.role)
    }

    /// True iff a user and credential are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Whether the current user ranks at least `required`. False when
    /// nobody is signed in.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.role().is_some_and(|role| role.satisfies(required))
    }

    /// Sign in.
    ///
    /// On failure the previous session, if any, is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for blank fields, otherwise the
    /// classified API failure with the server's message or "Login failed".
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        credentials.validate()?;

        let auth = self.api.authenticate(credentials).await.map_err(|e| {
            warn!(error = %e, "Login failed");
            ClientError::from_api(&e, LOGIN_FAILED)
        })?;

        if auth.access_token.is_empty() {
            warn!("Login response carried no token");
            return Err(ClientError::Authentication(LOGIN_FAILED.to_string()));
        }

        let user = auth.user.clone();
        self.inner.establish(Session {
            access_token: auth.access_token,
            user: auth.user,
        });
        add_breadcrumb("auth", "Signed in", Some(&[("role", user.role.as_str())]));
        info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(user)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for missing fields or a malformed
    /// email, otherwise the classified API failure.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        let email = registration.validate()?;

        let auth = self.api.register(registration, &email).await.map_err(|e| {
            warn!(error = %e, "Registration failed");
            ClientError::from_api(&e, REGISTRATION_FAILED)
        })?;

        if auth.access_token.is_empty() {
            warn!("Registration response carried no token");
            return Err(ClientError::Authentication(REGISTRATION_FAILED.to_string()));
        }

        let user = auth.user.clone();
        self.inner.establish(Session {
            access_token: auth.access_token,
            user: auth.user,
        });
        add_breadcrumb("auth", "Registered", None);
        info!(user_id = %user.id, "Registered and signed in");
        Ok(user)
    }

    /// Restore the persisted session and re-validate it with the API.
    ///
    /// Runs once; later calls just wait for the first to finish. Any
    /// validation failure clears the session in memory and in storage.
    ///
    /// If the call is dropped before validation answers, the status still
    /// becomes `Ready` and the restored session stays in place unvalidated;
    /// the next rejected request ends it.
    #[instrument(skip(self))]
    pub async fn rehydrate(&self) {
        if self.inner.rehydrate_started.swap(true, Ordering::SeqCst) {
            self.wait_until_ready().await;
            return;
        }
        let _ready = ReadyOnDrop(&self.inner.status);

        if let Some(session) = self.inner.load_persisted() {
            let generation = self.inner.establish(session);
            debug!("Restored persisted session, validating");

            match self.api.current_user().await {
                Ok(user) => {
                    if self.inner.replace_user(generation, user) {
                        info!("Persisted session is valid");
                    } else {
                        debug!("Session changed during validation, discarding result");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Persisted session failed validation");
                    self.inner.clear_if_current(generation);
                }
            }
        }
    }

    /// Sign out. Local only; no request is made.
    pub fn logout(&self) {
        self.inner.clear();
        add_breadcrumb("auth", "Signed out", None);
        info!("Signed out");
    }

    /// Update profile fields and merge the stored record into the session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Authentication` when nobody is signed in,
    /// otherwise the classified API failure.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        if !self.is_authenticated() {
            return Err(ClientError::Authentication(SIGN_IN_REQUIRED.to_string()));
        }
        let generation = self.inner.generation();

        let user = self.api.update_profile(update).await.map_err(|e| {
            warn!(error = %e, "Profile update failed");
            ClientError::from_api(&e, PROFILE_UPDATE_FAILED)
        })?;

        if !self.inner.replace_user(generation, user.clone()) {
            debug!("Session changed during profile update, not applying result");
        }
        Ok(user)
    }

    /// Change the password. Session state is unaffected.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for blank fields,
    /// `ClientError::Authentication` when nobody is signed in, otherwise the
    /// classified API failure.
    #[instrument(skip(self, change))]
    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        change.validate()?;
        if !self.is_authenticated() {
            return Err(ClientError::Authentication(SIGN_IN_REQUIRED.to_string()));
        }

        self.api.change_password(change).await.map_err(|e| {
            warn!(error = %e, "Password change failed");
            ClientError::from_api(&e, PASSWORD_CHANGE_FAILED)
        })
    }

    /// Counter bumped whenever the session is replaced or ended.
    pub(crate) fn generation(&self) -> u64 {
        self.inner.generation()
    }

    #[cfg(test)]
    pub(crate) fn sign_in_as(&self, session: Session) -> u64 {
        self.inner.establish(session)
    }
}

/// Flips the status to `Ready` when rehydration ends, however it ends.
struct ReadyOnDrop<'a>(&'a watch::Sender<SessionStatus>);

impl Drop for ReadyOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(SessionStatus::Ready);
    }
}
