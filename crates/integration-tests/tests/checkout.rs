//! Checkout flow against the mock API.

#![allow(clippy::unwrap_used)]

use fitwear_client::checkout::CheckoutState;
use fitwear_client::error::ClientError;
use fitwear_client::models::Credentials;
use fitwear_client::state::AppState;
use fitwear_core::{PaymentMethod, Price, ProductId};
use fitwear_integration_tests::MockApi;

async fn signed_in_with_cart(api: &MockApi) -> AppState {
    let app = api.app();
    app.bootstrap().await;
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();

    let tee = app.api().get_product(ProductId::new(1)).await.unwrap();
    let socks = app.api().get_product(ProductId::new(2)).await.unwrap();
    app.cart().add_to_cart(&tee, 2).unwrap();
    app.cart().add_to_cart(&socks, 3).unwrap();
    app
}

#[tokio::test]
async fn test_successful_checkout_clears_cart() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;
    let mut checkout = app.checkout();

    checkout.begin().unwrap();
    let purchase = checkout.confirm(PaymentMethod::Card).await.unwrap();

    assert!(app.cart().is_empty());
    assert_eq!(app.cart().total(), Price::ZERO);
    assert_eq!(purchase.total_amount, Price::from_cents(4900));
    assert_eq!(checkout.state(), &CheckoutState::Completed(purchase));
}

#[tokio::test]
async fn test_purchase_payload() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;
    let mut checkout = app.checkout();
    checkout.begin().unwrap();
    checkout.confirm(PaymentMethod::Cash).await.unwrap();

    let requests = api.requests_to("purchases");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    let body = &request.body;

    assert!(request.authorization.is_some());
    assert!(request.idempotency_key.is_some());
    assert_eq!(body["payment_method"], "cash");
    assert_eq!(body["payment_status"], "completed");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["notes"], "Customer purchase by Ana Lima");

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product_id"], 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["unit_price"].as_f64(), Some(24.5));
    assert_eq!(items[0]["total_price"].as_f64(), Some(49.0));
    // Unpriced product is sent at zero.
    assert_eq!(items[1]["unit_price"].as_f64(), Some(0.0));
    assert_eq!(items[1]["total_price"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart_and_allows_retry() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;
    let before = app.cart().lines();
    let mut checkout = app.checkout();
    checkout.begin().unwrap();

    api.fail_purchases(400, Some("Insufficient stock for Performance Tee"));
    let err = checkout.confirm(PaymentMethod::Card).await.unwrap_err();

    assert_eq!(err.to_string(), "Insufficient stock for Performance Tee");
    assert_eq!(app.cart().lines(), before);
    assert!(matches!(
        checkout.state(),
        CheckoutState::AwaitingPaymentSelection {
            last_error: Some(_),
            ..
        }
    ));

    api.accept_purchases();
    checkout.confirm(PaymentMethod::Card).await.unwrap();
    assert!(app.cart().is_empty());
}

#[tokio::test]
async fn test_server_error_uses_fallback_message() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;
    let mut checkout = app.checkout();
    checkout.begin().unwrap();

    api.fail_purchases(503, None);
    let err = checkout.confirm(PaymentMethod::Cash).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::NetworkOrServer("Purchase failed. Please try again.".to_string())
    );
    assert_eq!(app.cart().item_count(), 5);
}

#[tokio::test]
async fn test_retry_reuses_idempotency_key() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;
    let mut checkout = app.checkout();
    checkout.begin().unwrap();

    api.fail_purchases(500, None);
    let _ = checkout.confirm(PaymentMethod::Cash).await.unwrap_err();
    api.accept_purchases();
    checkout.confirm(PaymentMethod::Cash).await.unwrap();

    let keys: Vec<_> = api
        .requests_to("purchases")
        .into_iter()
        .map(|r| r.idempotency_key.unwrap())
        .collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);
}

#[tokio::test]
async fn test_edited_cart_after_failure_gets_new_key() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;
    let mut checkout = app.checkout();
    checkout.begin().unwrap();

    api.fail_purchases(400, Some("Insufficient stock for Performance Tee"));
    let _ = checkout.confirm(PaymentMethod::Card).await.unwrap_err();

    app.cart().update_quantity(ProductId::new(1), 1).unwrap();
    let shorts = app.api().get_product(ProductId::new(3)).await.unwrap();
    app.cart().add_to_cart(&shorts, 1).unwrap();
    api.accept_purchases();
    checkout.begin().unwrap();
    let purchase = checkout.confirm(PaymentMethod::Card).await.unwrap();

    let requests = api.requests_to("purchases");
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].idempotency_key, requests[1].idempotency_key);
    assert_eq!(requests[1].body["items"].as_array().unwrap().len(), 3);
    assert_eq!(purchase.items.len(), 3);
}

#[tokio::test]
async fn test_each_checkout_gets_a_new_key() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;

    let mut first = app.checkout();
    first.begin().unwrap();
    first.confirm(PaymentMethod::Cash).await.unwrap();

    let tee = app.api().get_product(ProductId::new(1)).await.unwrap();
    app.cart().add_to_cart(&tee, 1).unwrap();
    let mut second = app.checkout();
    second.begin().unwrap();
    second.confirm(PaymentMethod::Cash).await.unwrap();

    let keys: Vec<_> = api
        .requests_to("purchases")
        .into_iter()
        .filter_map(|r| r.idempotency_key)
        .collect();
    assert_ne!(keys[0], keys[1]);
    assert_eq!(api.purchases().len(), 2);
}

#[tokio::test]
async fn test_expired_session_during_checkout() {
    let api = MockApi::start().await;
    let app = signed_in_with_cart(&api).await;
    app.navigator().navigate("/cart");
    let mut checkout = app.checkout();
    checkout.begin().unwrap();

    api.expire_tokens();
    let err = checkout.confirm(PaymentMethod::Card).await.unwrap_err();

    assert!(matches!(err, ClientError::Authentication(_)));
    assert!(!app.session().is_authenticated());
    assert_eq!(app.navigator().current(), "/login?next=%2Fcart");
    assert_eq!(app.cart().item_count(), 5);
}

#[tokio::test]
async fn test_guest_checkout_redirects_without_touching_cart() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;
    let tee = app.api().get_product(ProductId::new(1)).await.unwrap();
    app.cart().add_to_cart(&tee, 1).unwrap();

    let mut checkout = app.checkout();
    let err = checkout.begin().unwrap_err();

    assert!(matches!(err, ClientError::Authentication(_)));
    assert_eq!(checkout.state(), &CheckoutState::Idle);
    assert_eq!(app.navigator().current(), "/login?next=%2Fcart");
    assert_eq!(app.cart().item_count(), 1);
    assert!(api.requests_to("purchases").is_empty());
}
