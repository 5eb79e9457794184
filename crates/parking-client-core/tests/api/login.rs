use parking_client_core::{
    router::{resolve, Resolution, Route},
    LoginOutcome,
};
use parking_shared::{
    const_config::storage::{
        STORAGE_KEY_ACCOUNT, STORAGE_KEY_ETAG, STORAGE_KEY_REFRESH_TOKEN, STORAGE_KEY_TOKEN,
    },
    errors::{ApiError, ErrorCategory},
    uac::Role,
};

use crate::helpers::{no_cb, spawn_app, TEST_LOGIN};

#[tokio::test]
async fn login_failure_invalid_password() {
    // Arrange
    let app = spawn_app().await;
    let login_args = app.login_args().password("random-password".into());

    // Act
    let outcome = app.core_client.login(login_args, no_cb).await.unwrap();

    // Assert
    let err = ApiError::from_anyhow(&outcome.unwrap_err());
    assert_eq!(err.category, ErrorCategory::Api);
    assert_eq!(err.message, "error.invalid.credentials");
    assert!(!app.core_client.is_logged_in());
    assert!(!app.store.snapshot().contains_key(STORAGE_KEY_TOKEN));
}

#[tokio::test]
async fn login_success_creates_session() {
    // Arrange
    let app = spawn_app().await;

    // Assert - Ensure not logged in
    assert!(
        !app.core_client.is_logged_in(),
        "should not be logged in before logging in"
    );

    // Act
    let outcome = app.login().await.unwrap();

    // Assert
    assert_eq!(outcome, LoginOutcome::Success);
    let session = app.core_client.current_session().unwrap();
    assert_eq!(session.login.as_ref(), TEST_LOGIN);
    assert_eq!(session.roles, vec![Role::Client, Role::Staff]);
    assert_eq!(session.active_role, Role::Client);
    assert_eq!(
        resolve("/login", Some(&session)),
        Resolution::Redirect { to: Route::Home }
    );
}

#[tokio::test]
async fn greeting_contains_login() {
    // Arrange
    let app = spawn_app().await;

    // Act
    app.login_assert().await;

    // Assert
    let greeting = app.core_client.current_session().unwrap().greeting();
    assert!(greeting.contains("jerzybem"), "greeting was: {greeting}");
}

#[tokio::test]
async fn login_persists_session() {
    // Arrange
    let app = spawn_app().await;

    // Act
    app.login_assert().await;

    // Assert
    let stored = app.store.snapshot();
    for key in [
        STORAGE_KEY_TOKEN,
        STORAGE_KEY_REFRESH_TOKEN,
        STORAGE_KEY_ACCOUNT,
        STORAGE_KEY_ETAG,
    ] {
        assert!(stored.contains_key(key), "{key} not stored");
    }
    assert_eq!(stored[STORAGE_KEY_ETAG], "\"v1\"");
    assert_eq!(app.core_client.account().unwrap().full_name(), "Jerzy Bem");
}

#[tokio::test]
async fn preferred_role_used_on_next_login() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    app.core_client.switch_role(Role::Staff).unwrap();
    let _ = app.core_client.logout(no_cb).await;

    // Act
    let outcome = app.login().await.unwrap();

    // Assert
    assert_eq!(outcome, LoginOutcome::Success);
    assert_eq!(
        app.core_client.current_session().unwrap().active_role,
        Role::Staff
    );
}

#[tokio::test]
async fn revoked_preferred_role_reported() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    app.core_client.switch_role(Role::Staff).unwrap();
    let _ = app.core_client.logout(no_cb).await;
    app.stub.lock().levels = vec![(Role::Client, true), (Role::Staff, false)];

    // Act
    let outcome = app.login().await.unwrap();

    // Assert
    assert_eq!(
        outcome,
        LoginOutcome::PreferredRoleUnavailable {
            active: Role::Client
        }
    );
}

#[tokio::test]
async fn account_without_active_roles_cannot_login() {
    // Arrange
    let app = spawn_app().await;
    app.stub.lock().levels = vec![(Role::Client, false)];

    // Act
    let outcome = app.login().await;

    // Assert
    let err = ApiError::from_anyhow(&outcome.unwrap_err());
    assert_eq!(err.message, "error.account.no.roles");
    assert!(!app.core_client.is_logged_in());
}
