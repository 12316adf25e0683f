//! Client-side navigation: current location, route table, access guard and
//! the role-gated menu.
//!
//! The [`Navigator`] is the single place the current location lives. Views
//! and the route guard write to it; anything that renders subscribes to it.

mod guard;
mod menu;
mod routes;

pub use guard::{GuardDecision, RouteGuard, decide};
pub use menu::{MenuEntry, build_menu};
pub use routes::{Access, DEFAULT_RETURN_TARGET, Route, split_location};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Holder of the current location.
///
/// Cheap to clone; clones share the location.
#[derive(Debug, Clone)]
pub struct Navigator {
    location: Arc<watch::Sender<String>>,
}

impl Navigator {
    /// Start at `initial`.
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        let (location, _) = watch::channel(initial.into());
        Self {
            location: Arc::new(location),
        }
    }

    /// The current location, path plus query.
    #[must_use]
    pub fn current(&self) -> String {
        self.location.borrow().clone()
    }

    /// Move to `location` unconditionally.
    pub fn navigate(&self, location: impl Into<String>) {
        let location = location.into();
        debug!(location = %location, "Navigating");
        self.location.send_replace(location);
    }

    /// Send the user to sign in, remembering where they were headed.
    pub fn redirect_to_login(&self, return_to: &str) {
        self.navigate(Route::login_redirect(return_to));
    }

    /// Receive every location change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_to_login_keeps_origin() {
        let navigator = Navigator::default();
        navigator.redirect_to_login("/sales?page=2");
        assert_eq!(navigator.current(), "/login?next=%2Fsales%3Fpage%3D2");
    }

    #[test]
    fn test_subscribers_see_changes() {
        let navigator = Navigator::new("/products");
        let mut rx = navigator.subscribe();
        navigator.navigate("/cart");
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(*rx.borrow_and_update(), "/cart");
    }
}
