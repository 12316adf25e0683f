//! Session store against the mock API: sign-in, registration, rehydration,
//! profile changes.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use fitwear_client::error::ClientError;
use fitwear_client::models::{Credentials, PasswordChange, ProfileUpdate, Registration};
use fitwear_client::session::SessionStatus;
use fitwear_client::storage::{MemoryStorage, Storage, keys};
use fitwear_core::Role;
use fitwear_integration_tests::MockApi;
use secrecy::SecretString;

// =============================================================================
// Login / Register
// =============================================================================

#[tokio::test]
async fn test_login_sets_and_persists_session() {
    let api = MockApi::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let app = api.app_with_storage(storage.clone());
    app.bootstrap().await;

    let user = app
        .session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();

    assert_eq!(user.username, "ana");
    assert!(app.session().is_authenticated());
    assert!(app.session().has_role(Role::Customer));
    assert!(!app.session().has_role(Role::Staff));

    let stored = storage.read(keys::SESSION).unwrap().unwrap();
    assert!(stored.contains("token-ana"));
}

#[tokio::test]
async fn test_login_failure_carries_server_message() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;

    let err = app
        .session()
        .login(&Credentials::new("ana", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ClientError::Authentication("Invalid username or password".to_string())
    );
    assert!(!app.session().is_authenticated());
}

#[tokio::test]
async fn test_login_sends_no_bearer_header() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();

    // Signing in again while signed in must not replay the old credential.
    app.session()
        .login(&Credentials::new("sam", "staffpass"))
        .await
        .unwrap();

    let logins = api.requests_to("auth/login");
    assert_eq!(logins.len(), 2);
    assert!(logins.iter().all(|r| r.authorization.is_none()));
    assert_eq!(app.session().role(), Some(Role::Staff));
}

#[tokio::test]
async fn test_register_signs_in_new_account() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;

    let form = Registration {
        username: "jo".to_string(),
        email: "jo@fitwear.test".to_string(),
        password: SecretString::from("s3cret!".to_string()),
        first_name: "Jo".to_string(),
        last_name: "Park".to_string(),
        phone: None,
        address: Some("1 Main St".to_string()),
    };
    let user = app.session().register(&form).await.unwrap();

    assert_eq!(user.full_name(), "Jo Park");
    assert_eq!(app.session().role(), Some(Role::Customer));

    let body = &api.requests_to("auth/register")[0].body;
    assert_eq!(body["email"], "jo@fitwear.test");
    assert_eq!(body["address"], "1 Main St");
    assert!(body.get("phone").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;

    let form = Registration {
        username: "ana".to_string(),
        email: "ana2@fitwear.test".to_string(),
        password: SecretString::from("pw".to_string()),
        first_name: "Ana".to_string(),
        last_name: "Lima".to_string(),
        phone: None,
        address: None,
    };
    let err = app.session().register(&form).await.unwrap_err();

    assert_eq!(err.to_string(), "Username already exists");
    assert!(matches!(err, ClientError::NetworkOrServer(_)));
}

// =============================================================================
// Rehydration
// =============================================================================

#[tokio::test]
async fn test_rehydrate_restores_valid_session() {
    let api = MockApi::start().await;
    let storage = Arc::new(MemoryStorage::new());

    let first = api.app_with_storage(storage.clone());
    first.bootstrap().await;
    first
        .session()
        .login(&Credentials::new("sam", "staffpass"))
        .await
        .unwrap();

    // Restart on the same storage.
    let second = api.app_with_storage(storage);
    assert_eq!(second.session().status(), SessionStatus::Loading);
    second.bootstrap().await;

    assert_eq!(second.session().status(), SessionStatus::Ready);
    assert!(second.session().has_role(Role::Staff));

    let profile = api.requests_to("auth/profile");
    assert_eq!(profile.len(), 1);
    assert!(
        profile[0]
            .authorization
            .as_deref()
            .unwrap()
            .starts_with("Bearer token-sam")
    );
}

#[tokio::test]
async fn test_rehydrate_with_rejected_token_clears_everything() {
    let api = MockApi::start().await;
    let storage = Arc::new(MemoryStorage::new());

    let first = api.app_with_storage(storage.clone());
    first.bootstrap().await;
    first
        .session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();

    api.expire_tokens();
    let second = api.app_with_storage(storage.clone());
    second.bootstrap().await;

    assert_eq!(second.session().status(), SessionStatus::Ready);
    assert!(second.session().current_user().is_none());
    assert_eq!(storage.read(keys::SESSION).unwrap(), None);
}

#[tokio::test]
async fn test_bootstrap_twice_validates_once() {
    let api = MockApi::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let first = api.app_with_storage(storage.clone());
    first.bootstrap().await;
    first
        .session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();

    let second = api.app_with_storage(storage);
    tokio::join!(second.bootstrap(), second.bootstrap());
    assert_eq!(api.requests_to("auth/profile").len(), 1);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_update_profile_merges_into_session() {
    let api = MockApi::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let app = api.app_with_storage(storage.clone());
    app.bootstrap().await;
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();

    let update = ProfileUpdate {
        phone: Some("555-0100".to_string()),
        ..ProfileUpdate::default()
    };
    let user = app.session().update_profile(&update).await.unwrap();

    assert_eq!(user.phone.as_deref(), Some("555-0100"));
    assert_eq!(
        app.session().current_user().unwrap().phone.as_deref(),
        Some("555-0100")
    );
    assert!(
        storage
            .read(keys::SESSION)
            .unwrap()
            .unwrap()
            .contains("555-0100")
    );
}

#[tokio::test]
async fn test_change_password_wrong_current() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();
    let before = app.session().current_user();

    let err = app
        .session()
        .change_password(&PasswordChange::new("nope", "newpass1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Current password is incorrect");

    app.session()
        .change_password(&PasswordChange::new("hunter22", "newpass1"))
        .await
        .unwrap();
    assert_eq!(app.session().current_user(), before);
}

#[tokio::test]
async fn test_logout_makes_no_request() {
    let api = MockApi::start().await;
    let app = api.app();
    app.bootstrap().await;
    app.session()
        .login(&Credentials::new("ana", "hunter22"))
        .await
        .unwrap();
    let seen = api.requests().len();

    app.session().logout();

    assert!(!app.session().is_authenticated());
    assert_eq!(api.requests().len(), seen);
}
