//! Application state shared across views.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::checkout::CheckoutFlow;
use crate::config::ClientConfig;
use crate::navigation::{MenuEntry, Navigator, RouteGuard, build_menu};
use crate::session::SessionStore;
use crate::storage::{FileStorage, Storage};

/// One session store, one cart store and one navigator per application.
///
/// This struct is cheaply cloneable via `Arc`; views receive a clone rather
/// than reaching for globals.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    navigator: Navigator,
    session: SessionStore,
    cart: CartStore,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api_base_url", &self.inner.config.api_base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the application with durable state under `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let storage = Arc::new(FileStorage::new(config.state_dir.clone()));
        Self::with_storage(config, storage)
    }

    /// Build the application on an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let navigator = Navigator::default();
        let session = SessionStore::new(&config, storage.clone(), navigator.clone())?;
        let cart = CartStore::load(storage);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                navigator,
                session,
                cart,
            }),
        })
    }

    /// Restore and validate the persisted session. Route decisions stay
    /// pending until this finishes.
    pub async fn bootstrap(&self) {
        self.inner.session.rehydrate().await;
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.inner.navigator
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// The API client carrying the session's credential.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        self.inner.session.api()
    }

    /// Route guard over this application's session.
    #[must_use]
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.inner.session.clone(), self.inner.navigator.clone())
    }

    /// A fresh checkout over this application's cart.
    #[must_use]
    pub fn checkout(&self) -> CheckoutFlow {
        CheckoutFlow::new(
            self.inner.session.clone(),
            self.inner.cart.clone(),
            self.inner.navigator.clone(),
        )
    }

    /// Navigation menu for the current actor.
    #[must_use]
    pub fn menu(&self) -> Vec<MenuEntry> {
        build_menu(self.inner.session.role(), self.inner.cart.item_count())
    }
}
