//! API gateway against the mock API: bearer header, central 401 handling,
//! catalogue and purchase endpoints.

#![allow(clippy::unwrap_used)]

use fitwear_client::api::ApiError;
use fitwear_client::models::{Credentials, ProductQuery};
use fitwear_core::{CategoryId, Price, ProductId, PurchaseId};
use fitwear_integration_tests::{EXPIRED_TOKEN_MESSAGE, MockApi};

#[tokio::test]
async fn test_bearer_header_attached_when_signed_in() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;

    app.api().list_products(&ProductQuery::default()).await.unwrap();
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();
    app.api().list_products(&ProductQuery::default()).await.unwrap();

    let listings = api.requests_to("products");
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].authorization, None);
    assert!(
        listings[1]
            .authorization
            .as_deref()
            .unwrap()
            .starts_with("Bearer token-ana-")
    );
}

#[tokio::test]
async fn test_unauthorized_response_ends_session_and_redirects() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();
    app.navigator().navigate("/purchases");

    api.expire_tokens();
    let err = app.api().list_purchases(1).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.server_message(), Some(EXPIRED_TOKEN_MESSAGE));
    assert!(!app.session().is_authenticated());
    assert_eq!(app.navigator().current(), "/login?next=%2Fpurchases");
}

#[tokio::test]
async fn test_unauthorized_login_does_not_redirect() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;
    app.navigator().navigate("/login");

    let _ = app
        .session()
        .login(&Credentials::new("ana", "bad"))
        .await
        .unwrap_err();
    assert_eq!(app.navigator().current(), "/login");
}

#[tokio::test]
async fn test_list_products_sends_filters() {
    let api = MockApi::start().await;
    let app = api.app();

    let query = ProductQuery {
        page: Some(2),
        per_page: Some(10),
        search: Some("tee shirt".to_string()),
        category_id: Some(CategoryId::new(4)),
    };
    let page = app.api().list_products(&query).await.unwrap();
    assert_eq!(page.products.len(), 3);

    let request = &api.requests_to("products")[0];
    assert_eq!(
        request.query.as_deref(),
        Some("page=2&per_page=10&search=tee+shirt&category_id=4")
    );
}

#[tokio::test]
async fn test_get_product_is_cached() {
    let api = MockApi::start().await;
    let app = api.app();

    let first = app.api().get_product(ProductId::new(1)).await.unwrap();
    let second = app.api().get_product(ProductId::new(1)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.selling_price, Some(Price::from_cents(2450)));
    assert_eq!(api.requests_to("products/1").len(), 1);
}

#[tokio::test]
async fn test_missing_product_is_rejected_with_404() {
    let api = MockApi::start().await;
    let app = api.app();

    let err = app.api().get_product(ProductId::new(42)).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Rejected { status: 404, ref message } if message.as_deref() == Some("Product not found")
    ));
}

#[tokio::test]
async fn test_other_customers_purchase_is_forbidden() {
    let api = MockApi::start().await;

    let staff = api.app();
    staff.bootstrap().await;
    staff
        .session()
        .login(&Credentials::new("sam", "staffpass"))
        .await
        .unwrap();
    staff.cart().add_to_cart(
        &staff.api().get_product(ProductId::new(3)).await.unwrap(),
        1,
    )
    .unwrap();
    let mut checkout = staff.checkout();
    checkout.begin().unwrap();
    let purchase = checkout
        .confirm(fitwear_core::PaymentMethod::Cash)
        .await
        .unwrap();

    let customer = api.app();
    customer.bootstrap().await;
    customer
        .session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();
    let err = customer.api().get_purchase(purchase.id).await.unwrap_err();

    assert!(matches!(err, ApiError::Forbidden(_)));
    // 403 does not end the session.
    assert!(customer.session().is_authenticated());
}

#[tokio::test]
async fn test_completed_purchase_cannot_be_cancelled() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();
    app.cart()
        .add_to_cart(&app.api().get_product(ProductId::new(1)).await.unwrap(), 1)
        .unwrap();
    let mut checkout = app.checkout();
    checkout.begin().unwrap();
    let purchase = checkout
        .confirm(fitwear_core::PaymentMethod::Card)
        .await
        .unwrap();

    let err = app.api().cancel_purchase(purchase.id).await.unwrap_err();
    assert_eq!(
        err.server_message(),
        Some("Only pending purchases can be cancelled")
    );

    let history = app.api().list_purchases(1).await.unwrap();
    assert_eq!(history.purchases.len(), 1);
    assert_eq!(history.purchases[0].id, PurchaseId::new(1));
}
