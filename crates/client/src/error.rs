//! Client error taxonomy with Sentry integration.
//!
//! Store operations return `Result<T, ClientError>`. The `Display` text of a
//! `ClientError` is the user-facing message, ready for a form or toast; the
//! variant tells the view how to surface it.

use thiserror::Error;

use fitwear_core::EmailError;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Input rejected locally, before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Quantity was zero or negative.
    #[error("Quantity must be a positive whole number (got {0})")]
    NonPositiveQuantity(i64),

    /// Quantity does not fit in a cart line.
    #[error("Quantity {0} is too large")]
    QuantityTooLarge(i64),

    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Email address is malformed.
    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Checkout started with nothing in the cart.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Payment confirmed without an open checkout.
    #[error("No checkout in progress")]
    NoCheckoutInProgress,
}

/// Error surfaced to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Rejected locally; never sent to the API.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Bad credentials or an expired session.
    #[error("{0}")]
    Authentication(String),

    /// Signed in, but the role is too low for the action.
    #[error("{0}")]
    Authorization(String),

    /// Unreachable server, 5xx, or a request the server refused.
    #[error("{0}")]
    NetworkOrServer(String),

    /// Durable storage could not be read or written.
    #[error("{0}")]
    Storage(String),
}

impl ClientError {
    /// Classify a gateway failure, preferring the server's own message and
    /// falling back to `fallback` when the server gave none.
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        let message = err
            .server_message()
            .map_or_else(|| fallback.to_string(), str::to_string);

        match err {
            ApiError::Unauthorized(_) => Self::Authentication(message),
            ApiError::Forbidden(_) => Self::Authorization(message),
            _ => Self::NetworkOrServer(message),
        }
    }

    /// Whether this is a local validation failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<StorageError> for ClientError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
