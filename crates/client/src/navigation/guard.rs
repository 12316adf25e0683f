//! Route guard.
//!
//! Decides, for every navigation, whether the screen may be shown, whether
//! the user must sign in first, or whether they are signed in but lack the
//! role. While the session is still rehydrating no protected screen is
//! allowed: the decision is [`GuardDecision::Pending`].

use fitwear_core::Role;
use tracing::{debug, info};

use super::routes::{Access, Route, split_location};
use super::Navigator;
use crate::session::{SessionStatus, SessionStore};

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still loading; render nothing protected yet.
    Pending,
    /// Show the requested screen.
    Allow,
    /// Not signed in; go to login and come back to `return_to` afterwards.
    RedirectToLogin { return_to: String },
    /// Signed in, but the role ranks too low.
    Forbidden,
}

impl GuardDecision {
    /// Location to move to instead of the requested one, if any.
    #[must_use]
    pub fn redirect_target(&self) -> Option<String> {
        match self {
            Self::RedirectToLogin { return_to } => Some(Route::login_redirect(return_to)),
            Self::Forbidden => Some(Route::Forbidden.path()),
            Self::Pending | Self::Allow => None,
        }
    }
}

/// Pure access decision.
///
/// `role` is the signed-in user's role, `None` when nobody is signed in.
#[must_use]
pub fn decide(
    status: SessionStatus,
    role: Option<Role>,
    access: Access,
    requested: &str,
) -> GuardDecision {
    if access == Access::Public {
        return GuardDecision::Allow;
    }
    if status == SessionStatus::Loading {
        return GuardDecision::Pending;
    }

    let Some(role) = role else {
        return GuardDecision::RedirectToLogin {
            return_to: requested.to_string(),
        };
    };

    match access {
        Access::AtLeast(required) if !role.satisfies(required) => GuardDecision::Forbidden,
        _ => GuardDecision::Allow,
    }
}

/// Guard bound to the application's session and navigator.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionStore,
    navigator: Navigator,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(session: SessionStore, navigator: Navigator) -> Self {
        Self { session, navigator }
    }

    /// Decide for `location` against the session as it is right now.
    ///
    /// Unknown paths are allowed; the view renders its not-found page.
    #[must_use]
    pub fn check(&self, location: &str) -> GuardDecision {
        let (path, _) = split_location(location);
        let access = Route::parse(path).map_or(Access::Public, |route| route.access());
        decide(
            self.session.status(),
            self.session.role(),
            access,
            location,
        )
    }

    /// Navigate to `location`, waiting for the session to finish loading
    /// first when the route is protected, and follow any redirect.
    ///
    /// Returns the decision that was applied.
    pub async fn navigate(&self, location: &str) -> GuardDecision {
        let mut decision = self.check(location);
        if decision == GuardDecision::Pending {
            debug!(location, "Waiting for session before deciding");
            self.session.wait_until_ready().await;
            decision = self.check(location);
        }

        match &decision {
            GuardDecision::Allow => self.navigator.navigate(location),
            GuardDecision::RedirectToLogin { return_to } => {
                info!(location, "Sign-in required");
                self.navigator.redirect_to_login(return_to);
            }
            GuardDecision::Forbidden => {
                info!(location, "Insufficient role for route");
                self.navigator.navigate(Route::Forbidden.path());
            }
            GuardDecision::Pending => {}
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAFF_ONLY: Access = Access::AtLeast(Role::Staff);

    #[test]
    fn test_unauthenticated_staff_route_goes_to_login() {
        let decision = decide(SessionStatus::Ready, None, STAFF_ONLY, "/inventory");
        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                return_to: "/inventory".to_string()
            }
        );
    }

    #[test]
    fn test_customer_on_staff_route_is_forbidden() {
        let decision = decide(
            SessionStatus::Ready,
            Some(Role::Customer),
            STAFF_ONLY,
            "/inventory",
        );
        assert_eq!(decision, GuardDecision::Forbidden);
        assert_eq!(decision.redirect_target().as_deref(), Some("/unauthorized"));
    }

    #[test]
    fn test_higher_roles_satisfy_lower_requirements() {
        for role in [Role::Staff, Role::Admin] {
            assert_eq!(
                decide(SessionStatus::Ready, Some(role), STAFF_ONLY, "/sales"),
                GuardDecision::Allow
            );
        }
        assert_eq!(
            decide(
                SessionStatus::Ready,
                Some(Role::Customer),
                Access::Authenticated,
                "/profile"
            ),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_loading_blocks_protected_routes_only() {
        assert_eq!(
            decide(SessionStatus::Loading, Some(Role::Admin), STAFF_ONLY, "/sales"),
            GuardDecision::Pending
        );
        assert_eq!(
            decide(SessionStatus::Loading, None, Access::Public, "/products"),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_login_redirect_target_encodes_origin() {
        let decision = GuardDecision::RedirectToLogin {
            return_to: "/purchases/4".to_string(),
        };
        assert_eq!(
            decision.redirect_target().as_deref(),
            Some("/login?next=%2Fpurchases%2F4")
        );
    }
}
