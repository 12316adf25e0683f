//! HTTP transport and typed endpoints.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, error, instrument, warn};
use url::Url;

use fitwear_core::{AccessToken, Email, IDEMPOTENCY_KEY_HEADER, IdempotencyKey, ProductId, PurchaseId};

use super::{ApiError, CredentialSource};
use crate::config::ClientConfig;
use crate::models::{
    Credentials, PasswordChange, Product, ProductPage, ProductQuery, ProfileUpdate, Purchase,
    PurchasePage, PurchaseRequest, Registration, User,
};

/// Response of the login and registration endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "token")]
    pub access_token: AccessToken,
    pub user: User,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[derive(Deserialize)]
struct PurchaseEnvelope {
    purchase: Purchase,
}

/// Error body shapes the API uses: `{"error"}` from route handlers, `{"msg"}`
/// from the JWT layer.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Whether to attach the session's bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Sign-in and registration: never send (or revoke) a credential.
    Anonymous,
    /// Attach the credential when a session exists.
    Bearer,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the FitWear REST API.
///
/// Cheap to clone; all clones share one connection pool, credential source
/// and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
    products: Cache<ProductId, Product>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                credentials,
                products,
            }),
        })
    }

    /// The API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        Ok(self.inner.client.request(method, url))
    }

    /// Send a request and decode a JSON response.
    ///
    /// A 401 on a request that carried a credential is reported to the
    /// credential source before the error is returned.
    async fn send<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let mut generation = None;
        if auth == Auth::Bearer
            && let Some((token, current)) = self.inner.credentials.current_credential()
        {
            request = request.bearer_auth(token.expose());
            generation = Some(current);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let body = if body.trim().is_empty() { "null" } else { body.as_str() };
            return serde_json::from_str(body).map_err(|e| {
                error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse FitWear API response"
                );
                ApiError::Decode(e)
            });
        }

        let message = error_message(&body);
        debug!(status = %status, message = ?message, "FitWear API returned non-success status");

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Some(generation) = generation {
                    warn!("Credential rejected by API, ending session");
                    self.inner.credentials.credential_rejected(generation);
                }
                Err(ApiError::Unauthorized(message))
            }
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden(message)),
            s if s.is_server_error() => {
                error!(status = %s, message = ?message, "FitWear API server error");
                Err(ApiError::Server {
                    status: s.as_u16(),
                    message,
                })
            }
            s => Err(ApiError::Rejected {
                status: s.as_u16(),
                message,
            }),
        }
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange credentials for a bearer token and user record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials, or a transport error.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/login")?
            .json(&credentials.to_body());
        self.send(request, Auth::Anonymous).await
    }

    /// Create an account; the response signs the new account in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the server refuses the registration.
    #[instrument(skip(self, registration, email), fields(username = %registration.username))]
    pub async fn register(
        &self,
        registration: &Registration,
        email: &Email,
    ) -> Result<AuthResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/register")?
            .json(&registration.to_body(email));
        self.send(request, Auth::Anonymous).await
    }

    /// Fetch the user the current credential belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is no longer valid.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "auth/profile")?;
        let envelope: UserEnvelope = self.send(request, Auth::Bearer).await?;
        Ok(envelope.user)
    }

    /// Update profile fields and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the update.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = self.request(Method::PUT, "auth/profile")?.json(update);
        let envelope: UserEnvelope = self.send(request, Auth::Bearer).await?;
        Ok(envelope.user)
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the current password is wrong.
    #[instrument(skip(self, change))]
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, "auth/change-password")?
            .json(&change.to_body());
        let _: IgnoredAny = self.send(request, Auth::Bearer).await?;
        Ok(())
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let mut url = self.inner.base_url.join("products/")?;
        if !query.to_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(query.to_pairs());
        }
        let request = self.inner.client.get(url);
        self.send(request, Auth::Bearer).await
    }

    /// Get a product by id, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with status 404 if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.products.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let request = self.request(Method::GET, &format!("products/{id}"))?;
        let envelope: ProductEnvelope = self.send(request, Auth::Bearer).await?;
        self.inner
            .products
            .insert(id, envelope.product.clone())
            .await;
        Ok(envelope.product)
    }

    // =========================================================================
    // Purchase Methods
    // =========================================================================

    /// Submit a purchase. Sent once; never retried here.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the purchase or is unreachable.
    #[instrument(skip(self, purchase), fields(lines = purchase.items.len(), idempotency_key = %key))]
    pub async fn create_purchase(
        &self,
        purchase: &PurchaseRequest,
        key: IdempotencyKey,
    ) -> Result<Purchase, ApiError> {
        let request = self
            .request(Method::POST, "purchases/")?
            .header(IDEMPOTENCY_KEY_HEADER, key.to_string())
            .json(purchase);
        let envelope: PurchaseEnvelope = self.send(request, Auth::Bearer).await?;
        Ok(envelope.purchase)
    }

    /// Purchase history visible to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_purchases(&self, page: u32) -> Result<PurchasePage, ApiError> {
        let mut url = self.inner.base_url.join("purchases/")?;
        url.query_pairs_mut().append_pair("page", &page.max(1).to_string());
        let request = self.inner.client.get(url);
        self.send(request, Auth::Bearer).await
    }

    /// Get a single purchase.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for another customer's purchase.
    #[instrument(skip(self), fields(purchase_id = %id))]
    pub async fn get_purchase(&self, id: PurchaseId) -> Result<Purchase, ApiError> {
        let request = self.request(Method::GET, &format!("purchases/{id}"))?;
        let envelope: PurchaseEnvelope = self.send(request, Auth::Bearer).await?;
        Ok(envelope.purchase)
    }

    /// Cancel a pending purchase.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the purchase is already completed or cancelled.
    #[instrument(skip(self), fields(purchase_id = %id))]
    pub async fn cancel_purchase(&self, id: PurchaseId) -> Result<Purchase, ApiError> {
        let request = self.request(Method::POST, &format!("purchases/{id}/cancel"))?;
        let envelope: PurchaseEnvelope = self.send(request, Auth::Bearer).await?;
        Ok(envelope.purchase)
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or(parsed.msg)
        .or(parsed.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
