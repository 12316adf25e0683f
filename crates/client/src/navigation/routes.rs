//! Route table.

use std::fmt;

use fitwear_core::{ProductId, PurchaseId, Role};

/// Where a successful sign-in lands when no usable return target was given.
pub const DEFAULT_RETURN_TARGET: &str = "/dashboard";

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users whose role ranks at least this high.
    AtLeast(Role),
}

/// Every screen of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    ProductDetail(ProductId),
    Cart,
    Login,
    Register,
    Dashboard,
    Inventory,
    Suppliers,
    Sales,
    Reports,
    Purchases,
    PurchaseDetail(PurchaseId),
    Profile,
    /// Shown when a signed-in user lacks the role for a screen.
    Forbidden,
}

impl Route {
    /// Resolve a location (path, optionally with query or fragment).
    ///
    /// Returns `None` for unknown paths.
    #[must_use]
    pub fn parse(location: &str) -> Option<Self> {
        let (path, _) = split_location(location);
        if !path.is_empty() && !path.starts_with('/') {
            return None;
        }
        let path = path.trim_end_matches('/');
        let mut segments = path.split('/').skip(1);

        let route = match (segments.next(), segments.next(), segments.next()) {
            (None, _, _) => Self::Home,
            (Some("products"), None, _) => Self::Products,
            (Some("products"), Some(id), None) => Self::ProductDetail(id.parse().ok()?),
            (Some("cart"), None, _) => Self::Cart,
            (Some("login"), None, _) => Self::Login,
            (Some("register"), None, _) => Self::Register,
            (Some("dashboard"), None, _) => Self::Dashboard,
            (Some("inventory"), None, _) => Self::Inventory,
            (Some("suppliers"), None, _) => Self::Suppliers,
            (Some("sales"), None, _) => Self::Sales,
            (Some("reports"), None, _) => Self::Reports,
            (Some("purchases"), None, _) => Self::Purchases,
            (Some("purchases"), Some(id), None) => Self::PurchaseDetail(id.parse().ok()?),
            (Some("profile"), None, _) => Self::Profile,
            (Some("unauthorized"), None, _) => Self::Forbidden,
            _ => return None,
        };
        Some(route)
    }

    /// Canonical path.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Products => "/products".to_string(),
            Self::ProductDetail(id) => format!("/products/{id}"),
            Self::Cart => "/cart".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Inventory => "/inventory".to_string(),
            Self::Suppliers => "/suppliers".to_string(),
            Self::Sales => "/sales".to_string(),
            Self::Reports => "/reports".to_string(),
            Self::Purchases => "/purchases".to_string(),
            Self::PurchaseDetail(id) => format!("/purchases/{id}"),
            Self::Profile => "/profile".to_string(),
            Self::Forbidden => "/unauthorized".to_string(),
        }
    }

    /// Who may open this route.
    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::Home
            | Self::Products
            | Self::ProductDetail(_)
            | Self::Cart
            | Self::Login
            | Self::Register
            | Self::Forbidden => Access::Public,
            Self::Dashboard | Self::Purchases | Self::PurchaseDetail(_) | Self::Profile => {
                Access::Authenticated
            }
            Self::Inventory | Self::Suppliers | Self::Sales | Self::Reports => {
                Access::AtLeast(Role::Staff)
            }
        }
    }

    /// Login location that returns to `return_to` after sign-in.
    #[must_use]
    pub fn login_redirect(return_to: &str) -> String {
        format!("/login?next={}", urlencoding::encode(return_to))
    }

    /// Where to go after sign-in, given the login page's query string.
    ///
    /// Only same-site relative paths are honoured; anything else lands on
    /// [`DEFAULT_RETURN_TARGET`].
    #[must_use]
    pub fn login_return_target(query: Option<&str>) -> String {
        query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .find_map(|pair| pair.strip_prefix("next="))
            .and_then(|raw| urlencoding::decode(raw).ok())
            .map(|target| target.into_owned())
            .filter(|target| is_relative_target(target))
            .unwrap_or_else(|| DEFAULT_RETURN_TARGET.to_string())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Split a location into its path and query, dropping any fragment.
#[must_use]
pub fn split_location(location: &str) -> (&str, Option<&str>) {
    let location = location.split('#').next().unwrap_or_default();
    match location.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (location, None),
    }
}

fn is_relative_target(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}
