//! Role-gated navigation menu.

use fitwear_core::Role;

use super::routes::Route;

/// One menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub route: Route,
    /// Count shown next to the label; `None` hides the badge.
    pub badge: Option<u64>,
}

impl MenuEntry {
    const fn link(label: &'static str, route: Route) -> Self {
        Self {
            label,
            route,
            badge: None,
        }
    }
}

/// Menu for the current actor.
///
/// `role` is `None` when nobody is signed in.
#[must_use]
pub fn build_menu(role: Option<Role>, cart_item_count: u64) -> Vec<MenuEntry> {
    let mut entries = vec![MenuEntry::link("Products", Route::Products)];

    match role {
        Some(role) if role.satisfies(Role::Staff) => entries.extend([
            MenuEntry::link("Dashboard", Route::Dashboard),
            MenuEntry::link("Inventory", Route::Inventory),
            MenuEntry::link("Sales", Route::Sales),
            MenuEntry::link("Suppliers", Route::Suppliers),
            MenuEntry::link("Reports", Route::Reports),
        ]),
        Some(_) => entries.extend([
            MenuEntry::link("Dashboard", Route::Dashboard),
            MenuEntry::link("My Purchases", Route::Purchases),
            MenuEntry::link("Profile", Route::Profile),
        ]),
        None => {}
    }

    entries.push(MenuEntry {
        label: "Cart",
        route: Route::Cart,
        badge: (cart_item_count > 0).then_some(cart_item_count),
    });

    if role.is_none() {
        entries.extend([
            MenuEntry::link("Login", Route::Login),
            MenuEntry::link("Register", Route::Register),
        ]);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[MenuEntry]) -> Vec<&'static str> {
        entries.iter().map(|e| e.label).collect()
    }

    #[test]
    fn test_guest_menu() {
        let menu = build_menu(None, 0);
        assert_eq!(labels(&menu), ["Products", "Cart", "Login", "Register"]);
        assert_eq!(menu[1].badge, None);
    }

    #[test]
    fn test_customer_menu_with_cart_badge() {
        let menu = build_menu(Some(Role::Customer), 3);
        assert_eq!(
            labels(&menu),
            ["Products", "Dashboard", "My Purchases", "Profile", "Cart"]
        );
        assert_eq!(menu.last().and_then(|e| e.badge), Some(3));
    }

    #[test]
    fn test_admin_gets_staff_menu() {
        let menu = build_menu(Some(Role::Admin), 0);
        assert!(labels(&menu).contains(&"Inventory"));
        assert!(!labels(&menu).contains(&"My Purchases"));
    }
}
