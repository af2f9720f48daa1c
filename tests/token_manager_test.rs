//! Token manager integration tests
//!
//! Exercises the proactive-refresh policy against a mock token endpoint.

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use sea_orm::EntityTrait;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mini_wrapped::db::entities::Users;
use mini_wrapped::error::AppError;
use mini_wrapped::services::{SpotifyClient, TokenManager};
use mini_wrapped::test_utils::{create_test_user, setup_test_db, test_config_with_provider};

fn expected_basic_auth() -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode("test_client_id:test_client_secret")
    )
}

async fn token_manager(server: &MockServer, db: &sea_orm::DatabaseConnection) -> TokenManager {
    let config = test_config_with_provider(&server.uri());
    TokenManager::new(db.clone(), SpotifyClient::new(&config))
}

#[tokio::test]
async fn test_expiring_token_triggers_refresh() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::minutes(3)).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", expected_basic_auth().as_str()))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=test_refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_access_token",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "new_refresh_token",
            "scope": "user-top-read",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_manager(&server, &db).await;
    let token = tokens.get_valid_access_token(user.id).await.unwrap();

    assert_eq!(token, "new_access_token");

    let stored = Users::find_by_id(user.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "new_access_token");
    assert_eq!(stored.refresh_token, "new_refresh_token");
    assert!(stored.token_expires_at.with_timezone(&Utc) > Utc::now() + Duration::minutes(50));
}

#[tokio::test]
async fn test_fresh_token_is_returned_without_refresh() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::minutes(10)).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tokens = token_manager(&server, &db).await;
    let token = tokens.get_valid_access_token(user.id).await.unwrap();

    assert_eq!(token, "test_access_token");
}

#[tokio::test]
async fn test_refresh_keeps_prior_refresh_token_when_omitted() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::minutes(1)).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_access_token",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_manager(&server, &db).await;
    tokens.get_valid_access_token(user.id).await.unwrap();

    let stored = Users::find_by_id(user.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "new_access_token");
    assert_eq!(stored.refresh_token, "test_refresh_token");
}

#[tokio::test]
async fn test_rejected_refresh_fails_without_mutating_state() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::minutes(1)).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_manager(&server, &db).await;
    let result = tokens.get_valid_access_token(user.id).await;

    assert!(matches!(result, Err(AppError::TokenRefreshFailed(_))));

    let stored = Users::find_by_id(user.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "test_access_token");
    assert_eq!(stored.refresh_token, "test_refresh_token");
}

#[tokio::test]
async fn test_unknown_user_fails_with_user_not_found() {
    let db = setup_test_db().await;
    let server = MockServer::start().await;

    let tokens = token_manager(&server, &db).await;
    let missing = Uuid::new_v4();
    let result = tokens.get_valid_access_token(missing).await;

    assert!(matches!(result, Err(AppError::UserNotFound(id)) if id == missing));
}
