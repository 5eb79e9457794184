use parking_client_core::{storage::MemoryStore, Client};
use parking_shared::{
    errors::{ApiError, ErrorCategory},
    id::ReservationId,
    messages::describe,
    req_args::RegisterReqArgs,
};

use crate::helpers::{no_cb, spawn_app, TEST_LOGIN};

fn register_args() -> RegisterReqArgs {
    RegisterReqArgs {
        login: TEST_LOGIN.try_into().unwrap(),
        email: "jerzy.bem@example.com".try_into().unwrap(),
        password: "P@ssw0rd!".into(),
        first_name: "Jerzy".try_into().unwrap(),
        last_name: "Bem".try_into().unwrap(),
        phone_number: "123456789".try_into().unwrap(),
    }
}

#[tokio::test]
async fn registration_reports_violations() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let actual = app
        .core_client
        .register(&register_args(), no_cb)
        .await
        .unwrap();

    // Assert
    let err = ApiError::from_anyhow(&actual.unwrap_err());
    assert_eq!(err.status, Some(400));
    assert_eq!(err.violations, vec!["login.size", "phone.number.format"]);
    let text = err.user_text();
    assert!(text.contains(describe("phone.number.format")), "got: {text}");
}

#[tokio::test]
async fn missing_reservation_reported() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    let id: ReservationId = "0f8fad5b-d9cb-469f-a165-70867728950e".parse().unwrap();

    // Act
    let actual = app.core_client.get_reservation(id, no_cb).await.unwrap();

    // Assert
    let err = ApiError::from_anyhow(&actual.unwrap_err());
    assert_eq!(err.category, ErrorCategory::Api);
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "error.reservation.not.found");
    assert!(app.core_client.is_logged_in());
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    // Arrange
    let core_client = Client::new(
        "http://127.0.0.1:1".to_string(),
        Box::new(MemoryStore::new()),
    );

    // Act
    let actual = core_client
        .register(&register_args(), no_cb)
        .await
        .unwrap();

    // Assert
    let err = ApiError::from_anyhow(&actual.unwrap_err());
    assert_eq!(err.category, ErrorCategory::Network);
    assert_eq!(err.status, None);
}
