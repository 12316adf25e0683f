//! Status enums for purchases.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a purchase is paid for.
///
/// This is only a label on the purchase record; no payment is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery (or at the till).
    #[default]
    Cash,
    /// Credit or debit card.
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Card => write!(f, "card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Payment state recorded on a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Lifecycle state of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    /// Whether the server will still accept a cancel request.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_round_trips_through_str() {
        for method in [PaymentMethod::Cash, PaymentMethod::Card] {
            assert_eq!(method.to_string().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_only_pending_purchases_cancel() {
        assert!(PurchaseStatus::Pending.is_cancellable());
        assert!(!PurchaseStatus::Completed.is_cancellable());
        assert!(!PurchaseStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_status_wire_names() {
        let status: PaymentStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, PaymentStatus::Completed);
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }
}
