//! Checkout flow: turns the cart into a submitted purchase.
//!
//! ```text
//! Idle ──begin──▶ AwaitingPaymentSelection ──confirm──▶ Submitting
//!                        ▲                                  │
//!                        └──────────── failure ─────────────┤
//!                                                           ▼
//!                                                       Completed
//! ```
//!
//! A failed submission returns to `AwaitingPaymentSelection` with the error
//! attached and the cart untouched, so the user can retry. Each checkout
//! carries an [`IdempotencyKey`], minted on `begin`. A retry reuses it only
//! if it would send the same request for the same session; a changed cart,
//! payment method or sign-in gets a fresh key. The request itself is sent
//! exactly once per confirmation.

use tracing::{debug, info, instrument, warn};

use fitwear_core::{IdempotencyKey, PaymentMethod, PaymentStatus, PurchaseStatus};

use crate::cart::{CartLine, CartStore};
use crate::error::{ClientError, Result, ValidationError, add_breadcrumb};
use crate::models::{Purchase, PurchaseItemRequest, PurchaseRequest, User};
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

const PURCHASE_FAILED: &str = "Purchase failed. Please try again.";
const SIGN_IN_TO_CHECKOUT: &str = "Please sign in to check out";

/// Where the checkout currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    /// Waiting for the user to pick cash or card. `last_error` is set after
    /// a failed submission.
    AwaitingPaymentSelection {
        key: IdempotencyKey,
        last_error: Option<String>,
    },
    /// Request in flight.
    Submitting {
        key: IdempotencyKey,
        payment_method: PaymentMethod,
    },
    Completed(Purchase),
}

/// A request already sent under `key`.
#[derive(Debug)]
struct Attempt {
    key: IdempotencyKey,
    generation: u64,
    request: PurchaseRequest,
}

impl Attempt {
    fn matches(&self, key: IdempotencyKey, generation: u64, request: &PurchaseRequest) -> bool {
        self.key == key && self.generation == generation && &self.request == request
    }
}

/// Checkout state machine bound to the application's stores.
#[derive(Debug)]
pub struct CheckoutFlow {
    session: SessionStore,
    cart: CartStore,
    navigator: Navigator,
    state: CheckoutState,
    last_attempt: Option<Attempt>,
}

impl CheckoutFlow {
    #[must_use]
    pub const fn new(session: SessionStore, cart: CartStore, navigator: Navigator) -> Self {
        Self {
            session,
            cart,
            navigator,
            state: CheckoutState::Idle,
            last_attempt: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Open payment selection for the current cart.
    ///
    /// Guests are sent to sign in (returning to the cart) and nothing
    /// changes. Calling again while already selecting keeps the same key.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Authentication` when nobody is signed in and
    /// `ValidationError::EmptyCart` when there is nothing to buy.
    pub fn begin(&mut self) -> Result<()> {
        if !self.session.is_authenticated() {
            self.navigator.redirect_to_login(&Route::Cart.path());
            return Err(ClientError::Authentication(SIGN_IN_TO_CHECKOUT.to_string()));
        }
        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        self.state = match &self.state {
            CheckoutState::AwaitingPaymentSelection { key, last_error } => {
                CheckoutState::AwaitingPaymentSelection {
                    key: *key,
                    last_error: last_error.clone(),
                }
            }
            // A submission abandoned mid-flight may have reached the server.
            CheckoutState::Submitting { key, .. } => CheckoutState::AwaitingPaymentSelection {
                key: *key,
                last_error: None,
            },
            CheckoutState::Idle | CheckoutState::Completed(_) => {
                self.last_attempt = None;
                CheckoutState::AwaitingPaymentSelection {
                    key: IdempotencyKey::generate(),
                    last_error: None,
                }
            }
        };
        add_breadcrumb("checkout", "Checkout started", None);
        Ok(())
    }

    /// Submit the cart with `payment_method`.
    ///
    /// On success the cart is cleared and the flow is `Completed`. On
    /// failure the cart is left as it was and the flow returns to payment
    /// selection with the error recorded.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoCheckoutInProgress` unless awaiting payment
    /// selection, `ValidationError::EmptyCart` if the cart was emptied
    /// meanwhile, `ClientError::Authentication` if the session ended, or the
    /// classified API failure.
    #[instrument(skip(self))]
    pub async fn confirm(&mut self, payment_method: PaymentMethod) -> Result<Purchase> {
        let CheckoutState::AwaitingPaymentSelection { key, .. } = self.state else {
            return Err(ValidationError::NoCheckoutInProgress.into());
        };

        let generation = self.session.generation();
        let Some(user) = self.session.current_user() else {
            self.state = CheckoutState::Idle;
            self.navigator.redirect_to_login(&Route::Cart.path());
            return Err(ClientError::Authentication(SIGN_IN_TO_CHECKOUT.to_string()));
        };
        let lines = self.cart.lines();
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let request = build_purchase_request(&lines, &user, payment_method);
        let key = match &self.last_attempt {
            Some(attempt) if !attempt.matches(key, generation, &request) => {
                debug!("Request changed since the last attempt, using a fresh idempotency key");
                IdempotencyKey::generate()
            }
            _ => key,
        };
        self.last_attempt = Some(Attempt {
            key,
            generation,
            request: request.clone(),
        });
        self.state = CheckoutState::Submitting {
            key,
            payment_method,
        };
        let method = payment_method.to_string();
        add_breadcrumb(
            "checkout",
            "Submitting purchase",
            Some(&[("payment_method", method.as_str())]),
        );

        match self.session.api().create_purchase(&request, key).await {
            Ok(purchase) => {
                self.cart.clear();
                self.last_attempt = None;
                info!(purchase_id = %purchase.id, total = %purchase.total_amount, "Purchase completed");
                self.state = CheckoutState::Completed(purchase.clone());
                Ok(purchase)
            }
            Err(e) => {
                warn!(error = %e, "Purchase submission failed");
                let err = ClientError::from_api(&e, PURCHASE_FAILED);
                self.state = CheckoutState::AwaitingPaymentSelection {
                    key,
                    last_error: Some(err.to_string()),
                };
                Err(err)
            }
        }
    }

    /// Abandon the checkout. The cart is kept.
    pub fn cancel(&mut self) {
        self.state = CheckoutState::Idle;
        self.last_attempt = None;
    }
}

/// Purchase request for `lines`, priced from the cart's snapshots.
#[must_use]
pub fn build_purchase_request(
    lines: &[CartLine],
    user: &User,
    payment_method: PaymentMethod,
) -> PurchaseRequest {
    PurchaseRequest {
        items: lines
            .iter()
            .map(|line| PurchaseItemRequest {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.price_or_zero(),
                total_price: line.line_total(),
            })
            .collect(),
        payment_method,
        payment_status: PaymentStatus::Completed,
        status: PurchaseStatus::Completed,
        notes: format!("Customer purchase by {}", user.full_name()),
    }
}
