use parking_shared::{
    const_config::storage::STORAGE_KEY_TOKEN, parking::SectorDeterminationStrategy,
    req_args::PageRequest,
};

use crate::helpers::{no_cb, spawn_app, PARKING_ID};

#[tokio::test]
async fn bearer_attached_when_logged_in() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;
    let token = app.store.snapshot()[STORAGE_KEY_TOKEN].clone();

    // Act
    let actual = app
        .core_client
        .get_parkings(&PageRequest::default(), no_cb)
        .await
        .unwrap();

    // Assert
    actual.unwrap();
    assert_eq!(
        app.stub.lock().last_authorization,
        Some(Some(format!("Bearer {token}")))
    );
}

#[tokio::test]
async fn no_bearer_when_logged_out() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let actual = app
        .core_client
        .get_parkings(&PageRequest::default(), no_cb)
        .await
        .unwrap();

    // Assert
    actual.unwrap();
    assert_eq!(app.stub.lock().last_authorization, Some(None));
}

#[tokio::test]
async fn parking_list_parsed() {
    // Arrange
    let app = spawn_app().await;
    app.login_assert().await;

    // Act
    let parkings = app
        .core_client
        .get_parkings(&PageRequest::default(), no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(parkings.len(), 1);
    let parking = &parkings[0];
    assert_eq!(parking.id.to_string(), PARKING_ID);
    assert_eq!(parking.strategy, SectorDeterminationStrategy::LeastOccupied);
    assert_eq!(parking.free_places(), 15);
    assert_eq!(parking.address(), "Wólczańska 215, 90-924 Łódź");
}
