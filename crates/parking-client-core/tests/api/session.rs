use std::sync::{Arc, Mutex};

use parking_client_core::{
    router::{resolve, Resolution, Route},
    session::{LogoutReason, SessionChange},
    token_monitor::{MonitorState, TokenMonitor},
};
use parking_shared::{
    const_config::{
        client::CLIENT_DEFAULT_TOKEN_REFRESH_LEAD,
        storage::{STORAGE_KEY_CHOSEN_USER_LEVEL, STORAGE_KEY_TOKEN, STORAGE_SESSION_KEYS},
    },
    errors::ApiError,
    req_args::PageRequest,
    uac::{AccountUpdate, Role},
};

use crate::helpers::{no_cb, spawn_app};

#[tokio::test]
async fn logout_clears_session_keys() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;

    // Act
    let outcome = app.core_client.logout(no_cb).await.unwrap();

    // Assert
    outcome.unwrap();
    let stored = app.store.snapshot();
    for key in STORAGE_SESSION_KEYS {
        assert!(!stored.contains_key(key), "{key} still stored");
    }
    assert!(!app.core_client.is_logged_in());
    assert_eq!(app.stub.lock().logout_calls, 1);
    assert_eq!(
        resolve("/home", app.core_client.current_session().as_deref()),
        Resolution::Redirect { to: Route::Login }
    );
}

#[tokio::test]
async fn role_switch_persists_across_reload() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;

    // Act
    app.core_client.switch_role(Role::Staff).unwrap();
    let reloaded = app.reload();

    // Assert
    let session = reloaded.current_session().expect("session not restored");
    assert_eq!(session.active_role, Role::Staff);
    assert_eq!(app.store.snapshot()[STORAGE_KEY_CHOSEN_USER_LEVEL], "STAFF");
}

#[tokio::test]
async fn switch_to_unassigned_role_rejected() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;

    // Act
    let actual = app.core_client.switch_role(Role::Admin);

    // Assert
    assert!(actual.is_err());
    assert_eq!(
        app.core_client.current_session().unwrap().active_role,
        Role::Client
    );
}

#[tokio::test]
async fn observers_told_about_login_and_logout() {
    // Arrange
    let app = spawn_app().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    app.core_client
        .session()
        .subscribe(move |change: &SessionChange| seen_clone.lock().unwrap().push(change.clone()));

    // Act
    app.login_assert().await;
    app.core_client.switch_role(Role::Staff).unwrap();
    app.core_client.logout_no_wait();

    // Assert
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(matches!(seen[0], SessionChange::LoggedIn { .. }));
    assert_eq!(seen[1], SessionChange::RoleChanged(Role::Staff));
    assert_eq!(seen[2], SessionChange::LoggedOut(LogoutReason::UserRequested));
}

#[tokio::test]
async fn monitor_follows_login() {
    // Arrange
    let app = spawn_app().await;
    let mut monitor = TokenMonitor::new(CLIENT_DEFAULT_TOKEN_REFRESH_LEAD);
    monitor.attach(app.core_client.session());

    // Act
    app.login_assert().await;
    let event = monitor.poll(parking_shared::time::Timestamp::now());

    // Assert
    assert_eq!(event, None);
    let expires_at = app.core_client.current_session().unwrap().expires_at;
    assert!(matches!(
        monitor.state(),
        MonitorState::Monitoring { expires_at: e, .. } if e == expires_at
    ));
}

#[tokio::test]
async fn refresh_replaces_tokens() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;

    // Act
    let actual = app.core_client.refresh_session(no_cb).await.unwrap();

    // Assert
    let expires_at = actual.unwrap();
    assert_eq!(
        app.core_client.current_session().unwrap().expires_at,
        expires_at
    );
    let stored = app.store.snapshot();
    assert_eq!(stored["refreshToken"], "r2");
    assert!(app.core_client.is_logged_in());
}

#[tokio::test]
async fn refresh_failure_tears_down_session() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    app.stub.lock().reject_refresh = true;

    // Act
    let actual = app.core_client.refresh_session(no_cb).await.unwrap();

    // Assert
    assert!(actual.is_err());
    assert!(!app.core_client.is_logged_in());
    assert!(!app.store.snapshot().contains_key(STORAGE_KEY_TOKEN));
}

#[tokio::test]
async fn rejected_token_ends_session() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    app.stub.lock().reject_tokens = true;

    // Act
    let actual = app
        .core_client
        .get_parkings(&PageRequest::default(), no_cb)
        .await
        .unwrap();

    // Assert
    assert!(ApiError::from_anyhow(&actual.unwrap_err()).is_session_expired());
    assert!(!app.core_client.is_logged_in());
}

#[tokio::test]
async fn refreshing_account_reconciles_revoked_role() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    app.stub.lock().levels = vec![(Role::Client, false), (Role::Staff, true)];

    // Act
    let account = app.core_client.refresh_own_account(no_cb).await.unwrap();

    // Assert
    account.unwrap();
    let session = app.core_client.current_session().unwrap();
    assert_eq!(session.active_role, Role::Staff);
    assert_eq!(session.roles, vec![Role::Staff]);
}

#[tokio::test]
async fn update_own_account_uses_etag() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    let update = AccountUpdate {
        first_name: "Jan".try_into().unwrap(),
        last_name: "Bem".try_into().unwrap(),
        phone_number: "987654321".try_into().unwrap(),
    };

    // Act
    let first = app
        .core_client
        .update_own_account(&update, no_cb)
        .await
        .unwrap();

    // Assert
    assert_eq!(first.unwrap().first_name.as_ref(), "Jan");
    assert_eq!(app.core_client.session().etag().as_deref(), Some("\"v2\""));

    // Act - Someone else changes the account
    app.stub.lock().etag_version += 1;
    let second = app
        .core_client
        .update_own_account(&update, no_cb)
        .await
        .unwrap();

    // Assert
    let err = ApiError::from_anyhow(&second.unwrap_err());
    assert_eq!(err.status, Some(412));
    assert_eq!(err.message, "error.optimistic.lock");
    assert!(app.core_client.is_logged_in());
}
