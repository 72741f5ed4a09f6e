//! Tests for the auth module

use super::*;
use chrono::{Duration, Utc};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn expired_credentials(refresh_token: Option<&str>) -> OAuth2Credentials {
    OAuth2Credentials {
        access_token: "stale-token".to_string(),
        refresh_token: refresh_token.map(str::to_string),
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        expires_at: Some(Utc::now() - Duration::seconds(60)),
    }
}

fn authorization(req: reqwest::RequestBuilder) -> String {
    let built = req.build().unwrap();
    built
        .headers()
        .get("Authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_basic_auth() {
    let auth = Authenticator::new(AuthConfig::basic("user", "pass"), "https://m.example.com");

    let client = reqwest::Client::new();
    let req = auth.apply(client.get("https://m.example.com/api/contacts")).await.unwrap();

    // base64("user:pass")
    assert_eq!(authorization(req), "Basic dXNlcjpwYXNz");
}

#[tokio::test]
async fn test_oauth2_uses_configured_token() {
    let auth = Authenticator::new(AuthConfig::bearer("my-token"), "https://m.example.com");

    let client = reqwest::Client::new();
    let req = auth.apply(client.get("https://m.example.com/api/contacts")).await.unwrap();

    assert_eq!(authorization(req), "Bearer my-token");
}

#[tokio::test]
async fn test_oauth2_refreshes_expired_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=my-refresh-token"))
        .and(body_string_contains("client_id=client"))
        .and(body_string_contains("client_secret=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed-token",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(
        AuthConfig::OAuth2(expired_credentials(Some("my-refresh-token"))),
        &mock_server.uri(),
    );

    let client = reqwest::Client::new();
    let first = auth.apply(client.get("https://example.com/api")).await.unwrap();
    assert_eq!(authorization(first), "Bearer refreshed-token");

    // Cached until expiry
    let second = auth.apply(client.get("https://example.com/api")).await.unwrap();
    assert_eq!(authorization(second), "Bearer refreshed-token");
}

#[tokio::test]
async fn test_oauth2_keeps_rotated_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("refresh_token=first-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token-1",
            "expires_in": 3600,
            "refresh_token": "second-refresh"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("refresh_token=second-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(
        AuthConfig::OAuth2(expired_credentials(Some("first-refresh"))),
        &mock_server.uri(),
    );
    let client = reqwest::Client::new();

    let req = auth.apply(client.get("https://example.com/api")).await.unwrap();
    assert_eq!(authorization(req), "Bearer token-1");

    auth.expire_token().await;
    let req = auth.apply(client.get("https://example.com/api")).await.unwrap();
    assert_eq!(authorization(req), "Bearer token-2");
}

#[tokio::test]
async fn test_oauth2_refresh_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(
        AuthConfig::OAuth2(expired_credentials(Some("revoked"))),
        &mock_server.uri(),
    );

    let client = reqwest::Client::new();
    let err = auth
        .apply(client.get("https://example.com/api"))
        .await
        .unwrap_err();

    assert!(matches!(err, crate::Error::TokenRefresh { .. }));
    assert!(err.to_string().contains("invalid_grant"));
}

#[tokio::test]
async fn test_oauth2_expired_without_refresh_token() {
    let auth = Authenticator::new(
        AuthConfig::OAuth2(expired_credentials(None)),
        "https://m.example.com",
    );

    let client = reqwest::Client::new();
    let err = auth
        .apply(client.get("https://example.com/api"))
        .await
        .unwrap_err();

    assert!(matches!(err, crate::Error::TokenRefresh { .. }));
}

#[test]
fn test_authenticator_endpoints() {
    let auth = Authenticator::new(AuthConfig::bearer("t"), "https://m.example.com/");
    assert_eq!(
        auth.endpoints().token_url,
        "https://m.example.com/oauth/v2/token"
    );
    assert_eq!(auth.config().kind(), "oauth2");
}
