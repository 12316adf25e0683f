//! FitWear REST API gateway.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per application, shared by the stores and the views
//! - Every request made on behalf of a signed-in user carries
//!   `Authorization: Bearer <token>`, read from a [`CredentialSource`]
//! - A 401 on such a request is reported back to the source before the error
//!   is returned, so the session is torn down exactly once, centrally
//! - Product lookups are cached in-process via `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use fitwear_client::api::ApiClient;
//!
//! let api = ApiClient::new(&config, session_credentials)?;
//! let page = api.list_products(&ProductQuery::default()).await?;
//! ```

mod client;

pub use client::ApiClient;

use fitwear_core::AccessToken;
use thiserror::Error;

/// Errors returned by the gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401: bad credentials or an expired/invalid bearer token.
    #[error("Unauthorized: {}", .0.as_deref().unwrap_or("authentication required"))]
    Unauthorized(Option<String>),

    /// 403: authenticated but not permitted.
    #[error("Forbidden: {}", .0.as_deref().unwrap_or("insufficient permissions"))]
    Forbidden(Option<String>),

    /// Other 4xx: the server refused the request as sent.
    #[error("Request rejected ({status}): {}", message.as_deref().unwrap_or("no details"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// 5xx from the server.
    #[error("Server error ({status}): {}", message.as_deref().unwrap_or("no details"))]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// Success status, but the body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// An endpoint path could not be joined onto the base URL.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// The server's own error message, when it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::Rejected { message, .. }
            | Self::Server { message, .. } => message.as_deref(),
            Self::Http(_) | Self::Decode(_) | Self::Url(_) => None,
        }
    }

    /// Whether the server rejected the bearer credential or the login.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Supplier of the bearer credential and receiver of its rejection.
///
/// Implemented by the session store. The generation identifies which
/// session a credential belonged to, so a late 401 for a session that has
/// since been replaced does not tear down its successor.
pub trait CredentialSource: Send + Sync {
    /// Current credential and the generation it belongs to.
    fn current_credential(&self) -> Option<(AccessToken, u64)>;

    /// The server answered 401 to a request sent with the credential of
    /// `generation`.
    fn credential_rejected(&self, generation: u64);
}
