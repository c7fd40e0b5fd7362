//! Authenticator tests against a wiremock token endpoint.
//!
//! Each test starts a mock server, points the authenticator's endpoints at it
//! and drives expiry with a `ManualClock`, so refresh behaviour is checked
//! without real time passing or real network calls.

use chrono::{Duration, TimeZone, Utc};
use dropbox_business::{Authenticator, Clock, DropboxError, Endpoints, ManualClock};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn start_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
}

fn authenticator(server: &MockServer, clock: &ManualClock) -> Authenticator {
    Authenticator::new("test_client", "test_secret", "http://localhost:8080/callback")
        .unwrap()
        .with_endpoints(Endpoints::with_base(&server.uri()))
        .with_clock(Arc::new(clock.clone()))
}

async fn mount_exchange(server: &MockServer, body: serde_json::Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer, body: serde_json::Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Code exchange
// ============================================================================

#[tokio::test]
async fn exchange_stores_tokens_without_refreshing() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 14400, "token_type": "bearer"}),
        1,
    )
    .await;
    mount_refresh(&server, json!({"access_token": "never"}), 0).await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("auth-code").await.unwrap();

    assert!(auth.is_authenticated().await);
    assert_eq!(auth.valid_access_token().await.unwrap(), "A");
    assert_eq!(auth.valid_access_token().await.unwrap(), "A");

    let expected_expiry = clock.now() + Duration::seconds(14400 - 300);
    assert_eq!(auth.token_expiry().await, Some(expected_expiry));
}

#[tokio::test]
async fn exchange_sends_credentials_and_code() {
    let server = MockServer::start().await;
    let clock = start_clock();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains("client_id=test_client"))
        .and(body_string_contains("client_secret=test_secret"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fcallback",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A"})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("the-code").await.unwrap();
    assert_eq!(auth.valid_access_token().await.unwrap(), "A");
}

#[tokio::test]
async fn exchange_failure_is_remote_error() {
    let server = MockServer::start().await;
    let clock = start_clock();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":"invalid_grant","error_description":"code doesn't exist or has expired"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = authenticator(&server, &clock);
    let err = auth.exchange_code("stale").await.unwrap_err();

    match err {
        DropboxError::Remote { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected Remote error, got {other:?}"),
    }
    assert!(!auth.is_authenticated().await);
    assert!(matches!(
        auth.valid_access_token().await,
        Err(DropboxError::IllegalState(_))
    ));
}

#[tokio::test]
async fn exchange_with_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    let clock = start_clock();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let auth = authenticator(&server, &clock);
    let err = auth.exchange_code("code").await.unwrap_err();
    assert!(matches!(err, DropboxError::Decode(_)));
}

#[tokio::test]
async fn exchange_without_expires_in_never_expires() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(&server, json!({"access_token": "A", "refresh_token": "R"}), 1).await;
    mount_refresh(&server, json!({"access_token": "B"}), 0).await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("code").await.unwrap();
    clock.advance(Duration::days(365));

    assert!(auth.token_expiry().await.is_none());
    assert!(!auth.is_token_expired().await);
    assert_eq!(auth.valid_access_token().await.unwrap(), "A");
}

#[tokio::test]
async fn second_exchange_overwrites_tokens() {
    let server = MockServer::start().await;
    let clock = start_clock();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("code=first"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A1", "refresh_token": "R1", "expires_in": 14400})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("code=second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .mount(&server)
        .await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("first").await.unwrap();
    auth.exchange_code("second").await.unwrap();

    let state = auth.token_state().await;
    assert_eq!(state.access_token.as_deref(), Some("A2"));
    assert!(state.refresh_token.is_none());
    assert!(state.expires_at.is_none());
}

#[tokio::test]
async fn exchange_with_out_of_range_expires_in_is_decode_error() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 1_000_000_000_000_000_i64}),
        1,
    )
    .await;

    let auth = authenticator(&server, &clock);
    let err = auth.exchange_code("code").await.unwrap_err();

    assert!(matches!(err, DropboxError::Decode(_)));
    assert!(!auth.is_authenticated().await);
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn expired_token_triggers_exactly_one_refresh() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 14400}),
        1,
    )
    .await;
    mount_refresh(&server, json!({"access_token": "B", "expires_in": 14400}), 1).await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("code").await.unwrap();

    clock.advance(Duration::seconds(14400 - 300 + 1));
    assert!(auth.is_token_expired().await);

    assert_eq!(auth.valid_access_token().await.unwrap(), "B");
    // The new token is fresh again, so no second refresh happens.
    assert_eq!(auth.valid_access_token().await.unwrap(), "B");

    let state = auth.token_state().await;
    assert_eq!(state.refresh_token.as_deref(), Some("R"));
    assert_eq!(
        state.expires_at,
        Some(clock.now() + Duration::seconds(14400 - 300))
    );
}

#[tokio::test]
async fn token_at_expiry_instant_is_still_valid() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 14400}),
        1,
    )
    .await;
    mount_refresh(&server, json!({"access_token": "B"}), 0).await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("code").await.unwrap();
    clock.advance(Duration::seconds(14400 - 300));

    assert_eq!(auth.valid_access_token().await.unwrap(), "A");
}

#[tokio::test]
async fn refresh_does_not_rotate_refresh_token() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 14400}),
        1,
    )
    .await;
    mount_refresh(
        &server,
        json!({"access_token": "B", "refresh_token": "R-new", "expires_in": 14400}),
        2,
    )
    .await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("code").await.unwrap();
    auth.refresh_access_token().await.unwrap();
    // Still matched by the `refresh_token=R` body matcher.
    auth.refresh_access_token().await.unwrap();

    let state = auth.token_state().await;
    assert_eq!(state.access_token.as_deref(), Some("B"));
    assert_eq!(state.refresh_token.as_deref(), Some("R"));
}

#[tokio::test]
async fn failed_refresh_keeps_previous_token() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 14400}),
        1,
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":"invalid_grant","error_description":"refresh token is invalid or revoked"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("code").await.unwrap();
    let expiry_before = auth.token_expiry().await;
    clock.advance(Duration::hours(5));

    let err = auth.valid_access_token().await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    let state = auth.token_state().await;
    assert_eq!(state.access_token.as_deref(), Some("A"));
    assert_eq!(state.refresh_token.as_deref(), Some("R"));
    assert_eq!(state.expires_at, expiry_before);
    assert!(auth.is_authenticated().await);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 14400}),
        1,
    )
    .await;
    mount_refresh(&server, json!({"access_token": "B", "expires_in": 14400}), 1).await;

    let auth = Arc::new(authenticator(&server, &clock));
    auth.exchange_code("code").await.unwrap();
    clock.advance(Duration::hours(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let auth = Arc::clone(&auth);
            tokio::spawn(async move { auth.valid_access_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "B");
    }
}

#[tokio::test]
async fn refresh_with_out_of_range_expires_in_keeps_previous_token() {
    let server = MockServer::start().await;
    let clock = start_clock();
    mount_exchange(
        &server,
        json!({"access_token": "A", "refresh_token": "R", "expires_in": 14400}),
        1,
    )
    .await;
    mount_refresh(
        &server,
        json!({"access_token": "B", "expires_in": 1_000_000_000_000_000_i64}),
        1,
    )
    .await;

    let auth = authenticator(&server, &clock);
    auth.exchange_code("code").await.unwrap();
    let expiry_before = auth.token_expiry().await;
    clock.advance(Duration::hours(4));

    let err = auth.valid_access_token().await.unwrap_err();
    assert!(matches!(err, DropboxError::Decode(_)));

    let state = auth.token_state().await;
    assert_eq!(state.access_token.as_deref(), Some("A"));
    assert_eq!(state.expires_at, expiry_before);
}
