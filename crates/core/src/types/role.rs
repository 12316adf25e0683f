//! Account roles and the role hierarchy.
//!
//! Access checks are "at least" checks: an admin may do anything a staff
//! member may do, and a staff member anything a customer may do.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rank of each role. Higher ranks satisfy every lower requirement.
const RANKING: [(Role, u8); 3] = [(Role::Customer, 1), (Role::Staff, 2), (Role::Admin, 3)];

/// Role of a FitWear account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shopper buying from the storefront.
    Customer,
    /// Store staff: inventory, sales, suppliers and reports.
    Staff,
    /// Full access, including staff management on the server.
    Admin,
}

/// Error returned when a role name is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Staff, Self::Admin];

    /// Position of this role in the hierarchy.
    #[must_use]
    pub fn level(self) -> u8 {
        RANKING
            .iter()
            .find_map(|&(role, level)| (role == self).then_some(level))
            .unwrap_or(0)
    }

    /// Whether this role meets `required` (rank comparison, not equality).
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self.level() >= required.level()
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_requirement() {
        assert!(!Role::Customer.satisfies(Role::Staff));
        assert!(Role::Staff.satisfies(Role::Staff));
        assert!(Role::Admin.satisfies(Role::Staff));
    }

    #[test]
    fn test_everyone_satisfies_customer() {
        for role in Role::ALL {
            assert!(role.satisfies(Role::Customer));
        }
    }

    #[test]
    fn test_levels_are_strictly_ordered() {
        let levels: Vec<u8> = Role::ALL.iter().map(|r| r.level()).collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(
            "manager".parse::<Role>(),
            Err(RoleParseError("manager".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Customer).unwrap(), "\"customer\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
