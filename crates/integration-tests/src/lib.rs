//! Integration tests for the FitWear client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fitwear-integration-tests
//! ```
//!
//! Each test starts its own [`MockApi`]: an in-process axum server on
//! `127.0.0.1:0` that speaks the FitWear REST contract, keeps accounts,
//! products and purchases in memory, and records every request it receives
//! so tests can assert on headers and bodies.
//!
//! # Fixtures
//!
//! | username | password   | role     |
//! |----------|------------|----------|
//! | `ana`    | `hunter22` | customer |
//! | `sam`    | `staffpass`| staff    |
//!
//! Products: 1 "Performance Tee" (24.50), 2 "Grip Socks" (no price),
//! 3 "Training Shorts" (30.00).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use fitwear_client::config::ClientConfig;
use fitwear_client::state::AppState;
use fitwear_client::storage::{MemoryStorage, Storage};

/// Message the mock sends with every 401 for a bearer request.
pub const EXPIRED_TOKEN_MESSAGE: &str = "Token has expired";

const CREATED_AT: &str = "2024-05-02T08:00:00";

/// One request as received by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below the API root, without leading or trailing slashes.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub idempotency_key: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    /// token -> user record
    sessions: Mutex<HashMap<String, Value>>,
    passwords: Mutex<HashMap<String, String>>,
    purchases: Mutex<Vec<Value>>,
    /// idempotency key -> index into `purchases`
    idempotency: Mutex<HashMap<String, usize>>,
    purchase_failure: Mutex<Option<(u16, Option<String>)>>,
    tokens_expired: AtomicBool,
    next_id: AtomicI64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process FitWear API.
pub struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            next_id: AtomicI64::new(100),
            ..MockState::default()
        });
        lock(&state.passwords).extend([
            ("ana".to_string(), "hunter22".to_string()),
            ("sam".to_string(), "staffpass".to_string()),
        ]);

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            server,
        }
    }

    /// Client configuration pointing at this mock.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.base_url).unwrap()
    }

    /// An application over fresh in-memory storage.
    #[must_use]
    pub fn app(&self) -> AppState {
        self.app_with_storage(Arc::new(MemoryStorage::new()))
    }

    /// An application over `storage`, e.g. to simulate a restart.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn app_with_storage(&self, storage: Arc<dyn Storage>) -> AppState {
        AppState::with_storage(self.config(), storage).unwrap()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Requests to `path` (below the API root, no slashes at either end).
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Purchases stored so far.
    #[must_use]
    pub fn purchases(&self) -> Vec<Value> {
        lock(&self.state.purchases).clone()
    }

    /// Make purchase creation answer `status` with an optional error message.
    pub fn fail_purchases(&self, status: u16, message: Option<&str>) {
        *lock(&self.state.purchase_failure) = Some((status, message.map(str::to_string)));
    }

    /// Let purchase creation succeed again.
    pub fn accept_purchases(&self) {
        *lock(&self.state.purchase_failure) = None;
    }

    /// Reject every bearer token from now on.
    pub fn expire_tokens(&self) {
        self.state.tokens_expired.store(true, Ordering::SeqCst);
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Request handling
// =============================================================================

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    reply(status, json!({ "error": message }))
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api")
        .unwrap_or_else(|| uri.path())
        .trim_matches('/')
        .to_string();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let request = RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: header("authorization"),
        idempotency_key: header("idempotency-key"),
        body,
    };
    lock(&state.requests).push(request.clone());

    let segments: Vec<&str> = path.split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("POST", ["auth", "login"]) => login(&state, &request.body),
        ("POST", ["auth", "register"]) => register(&state, &request.body),
        ("GET", ["products"]) => list_products(),
        ("GET", ["products", id]) => get_product(id),
        _ => {
            let Some((token, user)) = authenticate(&state, request.authorization.as_deref())
            else {
                return reply(
                    StatusCode::UNAUTHORIZED,
                    json!({ "msg": EXPIRED_TOKEN_MESSAGE }),
                );
            };
            authenticated(&state, &request, segments.as_slice(), &token, &user)
        }
    }
}

fn authenticated(
    state: &MockState,
    request: &RecordedRequest,
    segments: &[&str],
    token: &str,
    user: &Value,
) -> Response {
    match (request.method.as_str(), segments) {
        ("GET", ["auth", "profile"]) => reply(StatusCode::OK, json!({ "user": user })),
        ("PUT", ["auth", "profile"]) => update_profile(state, token, user, &request.body),
        ("PUT", ["auth", "change-password"]) => change_password(state, user, &request.body),
        ("POST", ["purchases"]) => create_purchase(state, request, user),
        ("GET", ["purchases"]) => list_purchases(state, user),
        ("GET", ["purchases", id]) => with_purchase(state, id, user, |p| {
            reply(StatusCode::OK, json!({ "purchase": p }))
        }),
        ("POST", ["purchases", id, "cancel"]) => cancel_purchase(state, id, user),
        _ => error(StatusCode::NOT_FOUND, "Not found"),
    }
}

fn authenticate(state: &MockState, authorization: Option<&str>) -> Option<(String, Value)> {
    if state.tokens_expired.load(Ordering::SeqCst) {
        return None;
    }
    let token = authorization?.strip_prefix("Bearer ")?;
    let user = lock(&state.sessions).get(token)?.clone();
    Some((token.to_string(), user))
}

fn user_record(id: i64, username: &str, first: &str, last: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@fitwear.test"),
        "first_name": first,
        "last_name": last,
        "phone": null,
        "address": null,
        "role": role,
        "is_active": true,
        "created_at": CREATED_AT,
        "updated_at": CREATED_AT,
    })
}

fn issue_token(state: &MockState, user: Value) -> Response {
    let n = state.next_id.fetch_add(1, Ordering::SeqCst);
    let username = user["username"].as_str().unwrap_or_default().to_string();
    let token = format!("token-{username}-{n}");
    lock(&state.sessions).insert(token.clone(), user.clone());
    reply(
        StatusCode::OK,
        json!({ "access_token": token, "user": user }),
    )
}

fn login(state: &MockState, body: &Value) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let valid = lock(&state.passwords).get(username).map(String::as_str) == Some(password);
    if !valid {
        return error(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let user = match username {
        "sam" => user_record(2, "sam", "Sam", "Reyes", "staff"),
        _ => user_record(1, "ana", "Ana", "Lima", "customer"),
    };
    issue_token(state, user)
}

fn register(state: &MockState, body: &Value) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if lock(&state.passwords).contains_key(&username) {
        return error(StatusCode::BAD_REQUEST, "Username already exists");
    }
    lock(&state.passwords).insert(
        username.clone(),
        body["password"].as_str().unwrap_or_default().to_string(),
    );

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let mut user = user_record(
        id,
        &username,
        body["first_name"].as_str().unwrap_or_default(),
        body["last_name"].as_str().unwrap_or_default(),
        "customer",
    );
    user["email"] = body["email"].clone();
    issue_token(state, user)
}

fn update_profile(state: &MockState, token: &str, user: &Value, body: &Value) -> Response {
    let mut updated = user.clone();
    for field in ["first_name", "last_name", "email", "phone", "address"] {
        if let Some(value) = body.get(field) {
            updated[field] = value.clone();
        }
    }
    lock(&state.sessions).insert(token.to_string(), updated.clone());
    reply(
        StatusCode::OK,
        json!({ "message": "Profile updated successfully", "user": updated }),
    )
}

fn change_password(state: &MockState, user: &Value, body: &Value) -> Response {
    let username = user["username"].as_str().unwrap_or_default().to_string();
    let mut passwords = lock(&state.passwords);
    if passwords.get(&username).map(String::as_str) != body["current_password"].as_str() {
        return error(StatusCode::BAD_REQUEST, "Current password is incorrect");
    }
    passwords.insert(
        username,
        body["new_password"].as_str().unwrap_or_default().to_string(),
    );
    reply(
        StatusCode::OK,
        json!({ "message": "Password changed successfully" }),
    )
}

fn catalogue() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Performance Tee", "sku": "TEE-001", "brand": "FitWear",
               "size": "M", "color": "Black", "selling_price": 24.5, "cost_price": 10.0,
               "image_url": "/img/tee.png", "is_active": true}),
        json!({"id": 2, "name": "Grip Socks", "sku": "SOCK-002", "is_active": true}),
        json!({"id": 3, "name": "Training Shorts", "sku": "SHO-003", "selling_price": 30.0,
               "description": "Lightweight shorts", "is_active": true}),
    ]
}

fn list_products() -> Response {
    let products = catalogue();
    reply(
        StatusCode::OK,
        json!({ "products": products, "total": products.len(), "pages": 1, "current_page": 1 }),
    )
}

fn get_product(id: &str) -> Response {
    catalogue()
        .into_iter()
        .find(|p| p["id"].to_string() == id)
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Product not found"),
            |product| reply(StatusCode::OK, json!({ "product": product })),
        )
}

fn create_purchase(state: &MockState, request: &RecordedRequest, user: &Value) -> Response {
    if let Some((status, message)) = lock(&state.purchase_failure).clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return match message {
            Some(message) => error(status, &message),
            None => reply(status, Value::Null),
        };
    }

    let replayed = request
        .idempotency_key
        .as_ref()
        .and_then(|key| lock(&state.idempotency).get(key).copied());
    if let Some(index) = replayed {
        let existing = lock(&state.purchases).get(index).cloned();
        return reply(StatusCode::CREATED, json!({ "purchase": existing }));
    }

    let body = &request.body;
    let items: Vec<Value> = body["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            json!({
                "id": i + 1,
                "product_id": item["product_id"],
                "quantity": item["quantity"],
                "unit_price": item["unit_price"],
                "total_price": item["total_price"],
            })
        })
        .collect();
    let total: f64 = items
        .iter()
        .filter_map(|item| item["total_price"].as_f64())
        .sum();

    let mut purchases = lock(&state.purchases);
    let purchase = json!({
        "id": purchases.len() + 1,
        "user_id": user["id"],
        "total_amount": total,
        "payment_method": body["payment_method"],
        "payment_status": body["payment_status"],
        "status": body["status"],
        "notes": body["notes"],
        "created_at": CREATED_AT,
        "items": items,
    });
    purchases.push(purchase.clone());
    if let Some(key) = &request.idempotency_key {
        lock(&state.idempotency).insert(key.clone(), purchases.len() - 1);
    }

    reply(
        StatusCode::CREATED,
        json!({ "message": "Purchase created successfully", "purchase": purchase }),
    )
}

fn visible_to(purchase: &Value, user: &Value) -> bool {
    user["role"] != "customer" || purchase["user_id"] == user["id"]
}

fn list_purchases(state: &MockState, user: &Value) -> Response {
    let purchases: Vec<Value> = lock(&state.purchases)
        .iter()
        .filter(|p| visible_to(p, user))
        .cloned()
        .collect();
    reply(
        StatusCode::OK,
        json!({ "purchases": purchases, "total": purchases.len(), "pages": 1, "current_page": 1 }),
    )
}

fn with_purchase(
    state: &MockState,
    id: &str,
    user: &Value,
    f: impl FnOnce(&mut Value) -> Response,
) -> Response {
    let mut purchases = lock(&state.purchases);
    let Some(purchase) = purchases.iter_mut().find(|p| p["id"].to_string() == id) else {
        return error(StatusCode::NOT_FOUND, "Purchase not found");
    };
    if !visible_to(purchase, user) {
        return error(StatusCode::FORBIDDEN, "Access denied");
    }
    f(purchase)
}

fn cancel_purchase(state: &MockState, id: &str, user: &Value) -> Response {
    with_purchase(state, id, user, |purchase| {
        if purchase["status"] != "pending" {
            return error(
                StatusCode::BAD_REQUEST,
                "Only pending purchases can be cancelled",
            );
        }
        purchase["status"] = json!("cancelled");
        reply(StatusCode::OK, json!({ "purchase": purchase }))
    })
}
