//! Cart store.
//!
//! The lines a shopper intends to buy, keyed by product id, persisted under
//! [`keys::CART`] so the cart survives restarts. Independent of the session:
//! guests may fill a cart before signing in.
//!
//! Every mutation takes the line lock, changes the lines, and writes the
//! snapshot to storage before releasing it. Two concurrent mutations are
//! therefore applied and persisted in the same order, and neither can
//! overwrite the other's change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fitwear_core::{Price, ProductId};

use crate::error::{ValidationError, add_breadcrumb};
use crate::models::Product;
use crate::storage::{Storage, keys, load_json, save_json};

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    /// Price when the line was created. `None` if the product carried none.
    #[serde(default)]
    pub unit_price: Option<Price>,
    /// Always at least 1.
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CartLine {
    fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.selling_price,
            quantity,
            image_url: product.image_url.clone(),
            description: product.description.clone(),
        }
    }

    /// Unit price, zero when unknown.
    #[must_use]
    pub fn price_or_zero(&self) -> Price {
        self.unit_price.unwrap_or(Price::ZERO)
    }

    /// `unit_price × quantity`, zero when the price is unknown.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price_or_zero().times(self.quantity)
    }
}

/// Handle to the cart store. Cheap to clone; clones share the cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    lines: Mutex<Vec<CartLine>>,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the cart persisted in `storage`, or an empty one.
    ///
    /// Stored lines with quantity 0 are dropped and repeated product ids
    /// are merged.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let stored: Vec<CartLine> = load_json(storage.as_ref(), keys::CART).unwrap_or_default();

        let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());
        for line in stored.into_iter().filter(|l| l.quantity > 0) {
            match lines.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }
        debug!(lines = lines.len(), "Loaded cart");

        Self {
            inner: Arc::new(CartInner {
                lines: Mutex::new(lines),
                storage,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartLine>> {
        self.inner.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the lines and persist the result, all under the lock.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<CartLine>) -> R) -> R {
        let mut lines = self.lock();
        let result = f(&mut lines);
        if let Err(e) = save_json(self.inner.storage.as_ref(), keys::CART, lines.as_slice()) {
            warn!(error = %e, "Failed to persist cart");
        }
        result
    }

    /// Snapshot of the lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Add `quantity` of `product`, merging into an existing line.
    ///
    /// A new line snapshots the product's current price.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NonPositiveQuantity` for `quantity <= 0` and
    /// `ValidationError::QuantityTooLarge` if the line or the cart total
    /// would overflow. The cart is unchanged on error.
    pub fn add_to_cart(&self, product: &Product, quantity: i64) -> Result<(), ValidationError> {
        let added = positive_quantity(quantity)?;

        self.mutate(|lines| -> Result<(), ValidationError> {
            let mut updated = lines.clone();
            if let Some(line) = updated.iter_mut().find(|l| l.product_id == product.id) {
                line.quantity = line
                    .quantity
                    .checked_add(added)
                    .ok_or(ValidationError::QuantityTooLarge(quantity))?;
            } else {
                updated.push(CartLine::from_product(product, added));
            }
            checked_total(&updated).ok_or(ValidationError::QuantityTooLarge(quantity))?;
            *lines = updated;
            Ok(())
        })?;

        let product_id = product.id.to_string();
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        debug!(product_id = %product.id, quantity = added, "Added to cart");
        Ok(())
    }

    /// Remove the line for `product_id`. Absent ids are ignored.
    pub fn remove_from_cart(&self, product_id: ProductId) {
        let removed = self.mutate(|lines| {
            let before = lines.len();
            lines.retain(|l| l.product_id != product_id);
            lines.len() != before
        });

        if removed {
            let id = product_id.to_string();
            add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", id.as_str())]));
            debug!(product_id = %product_id, "Removed from cart");
        }
    }

    /// Set the line's quantity to exactly `quantity`; `quantity <= 0`
    /// removes it. Absent ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::QuantityTooLarge` if `quantity` does not
    /// fit in a line or the cart total would overflow. The cart is unchanged
    /// on error.
    pub fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), ValidationError> {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return Ok(());
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| ValidationError::QuantityTooLarge(quantity))?;

        self.mutate(|lines| -> Result<(), ValidationError> {
            let mut updated = lines.clone();
            if let Some(line) = updated.iter_mut().find(|l| l.product_id == product_id) {
                line.quantity = quantity;
            }
            checked_total(&updated)
                .ok_or_else(|| ValidationError::QuantityTooLarge(quantity.into()))?;
            *lines = updated;
            Ok(())
        })
    }

    /// Sum of line totals. Zero for an empty cart; unpriced lines count 0.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lock().iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lock().iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.mutate(Vec::clear);
        debug!("Cart cleared");
    }
}

/// Cart total, or `None` if it does not fit in a [`Price`].
fn checked_total(lines: &[CartLine]) -> Option<Price> {
    lines.iter().try_fold(Price::ZERO, |total, line| {
        total.checked_add(line.price_or_zero().checked_times(line.quantity)?)
    })
}

fn positive_quantity(quantity: i64) -> Result<u32, ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::NonPositiveQuantity(quantity));
    }
    u32::try_from(quantity).map_err(|_| ValidationError::QuantityTooLarge(quantity))
}
