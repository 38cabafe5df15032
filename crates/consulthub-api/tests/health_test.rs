//! Health endpoints and WebSocket upgrade authentication.

mod helpers;

use axum::http::StatusCode;

#[tokio::test]
async fn test_health_check() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_detailed_health_reports_engine() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health/detailed", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["database"], "memory");
    assert_eq!(data["realtime"]["pubsub"], "memory");
    assert_eq!(data["realtime"]["ledger"], "memory");
    assert_eq!(data["realtime"]["connections"], 0);
}

#[tokio::test]
async fn test_ws_upgrade_without_token() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/ws", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_ws_upgrade_with_bad_token() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/ws?token=not-a-jwt", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_token_accepted_before_upgrade_check() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.client();

    // A plain GET is not upgradable, but it must get past authentication.
    let response = app
        .request("GET", &format!("/ws?token={token}"), None, None)
        .await;

    assert_ne!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.status.is_client_error());
}
