//! Purchase orders.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use fitwear_core::{
    PaymentMethod, PaymentStatus, Price, ProductId, PurchaseId, PurchaseItemId, PurchaseStatus,
    UserId,
};

/// Body of a purchase-creation request.
///
/// Built fresh from the cart at checkout time and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRequest {
    pub items: Vec<PurchaseItemRequest>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: PurchaseStatus,
    pub notes: String,
}

/// One requested line. Prices are the client's own snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "fitwear_core::price::as_number")]
    pub unit_price: Price,
    #[serde(with = "fitwear_core::price::as_number")]
    pub total_price: Price,
}

/// A purchase as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub total_amount: Price,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: PurchaseStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub items: Vec<PurchaseItem>,
}

/// A stored purchase line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: PurchaseItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Price,
}

/// One page of purchase history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasePage {
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub current_page: u32,
}
