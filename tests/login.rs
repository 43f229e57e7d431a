//! Login flow tests: single-use redemption, expiry, and the entitlement
//! decision at redemption time.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::{json, Value};
use subgate::error::AppError;
use tower::ServiceExt;

// ============ Store-level redemption semantics ============

#[test]
fn redeem_grants_for_entitled_email() {
    let mut conn = setup_test_db();
    create_active_subscriber(&conn, "a@x.com", "cus_1", "sub_1");
    let token = queries::issue_login_token(&conn, "a@x.com").unwrap();

    let entitlement = queries::redeem_login_token(&mut conn, &token.token).unwrap();

    assert_eq!(entitlement, Entitlement::Granted { email: "a@x.com".to_string() });
}

#[test]
fn second_redeem_of_same_token_is_invalid() {
    let mut conn = setup_test_db();
    create_active_subscriber(&conn, "a@x.com", "cus_1", "sub_1");
    let token = queries::issue_login_token(&conn, "a@x.com").unwrap();

    queries::redeem_login_token(&mut conn, &token.token).unwrap();
    let second = queries::redeem_login_token(&mut conn, &token.token);

    // Indistinguishable from a token that never existed.
    assert!(matches!(second, Err(AppError::InvalidToken)));
}

#[test]
fn unknown_token_is_invalid() {
    let mut conn = setup_test_db();

    let result = queries::redeem_login_token(&mut conn, "never-issued");

    assert!(matches!(result, Err(AppError::InvalidToken)));
}

#[test]
fn expired_token_fails_and_becomes_permanently_unusable() {
    let mut conn = setup_test_db();
    create_active_subscriber(&conn, "a@x.com", "cus_1", "sub_1");
    insert_login_token(&conn, "stale-token", "a@x.com", past_timestamp(1));

    let first = queries::redeem_login_token(&mut conn, "stale-token");
    assert!(matches!(first, Err(AppError::TokenExpired)));

    // The expired row is deleted on the failed attempt, so a later retry
    // reports invalid, never success.
    assert!(queries::get_login_token(&conn, "stale-token").unwrap().is_none());
    let second = queries::redeem_login_token(&mut conn, "stale-token");
    assert!(matches!(second, Err(AppError::InvalidToken)));
}

#[test]
fn redeem_without_subscriber_is_denied() {
    let mut conn = setup_test_db();
    let token = queries::issue_login_token(&conn, "a@x.com").unwrap();

    let entitlement = queries::redeem_login_token(&mut conn, &token.token).unwrap();

    assert_eq!(entitlement, Entitlement::Denied { email: "a@x.com".to_string() });
    // Denial still consumes the token.
    assert!(queries::get_login_token(&conn, &token.token).unwrap().is_none());
}

#[test]
fn redeem_with_inactive_subscriber_is_denied() {
    for status in [SubscriptionStatus::PastDue, SubscriptionStatus::Canceled] {
        let mut conn = setup_test_db();
        queries::upsert_subscriber_from_checkout(
            &conn,
            "a@x.com",
            Some("cus_1"),
            Some("sub_1"),
            status,
            None,
        )
        .unwrap();
        let token = queries::issue_login_token(&conn, "a@x.com").unwrap();

        let entitlement = queries::redeem_login_token(&mut conn, &token.token).unwrap();

        assert_eq!(
            entitlement,
            Entitlement::Denied { email: "a@x.com".to_string() },
            "status {:?} must not grant",
            status
        );
    }
}

#[test]
fn multiple_live_tokens_per_email_are_independent() {
    let mut conn = setup_test_db();
    create_active_subscriber(&conn, "a@x.com", "cus_1", "sub_1");
    let first = queries::issue_login_token(&conn, "a@x.com").unwrap();
    let second = queries::issue_login_token(&conn, "a@x.com").unwrap();
    assert_ne!(first.token, second.token);

    queries::redeem_login_token(&mut conn, &first.token).unwrap();

    // Redeeming one token does not touch the other.
    let entitlement = queries::redeem_login_token(&mut conn, &second.token).unwrap();
    assert_eq!(entitlement, Entitlement::Granted { email: "a@x.com".to_string() });
}

#[test]
fn cleanup_prunes_only_expired_tokens() {
    let conn = setup_test_db();
    insert_login_token(&conn, "stale", "a@x.com", past_timestamp(1));
    let live = queries::issue_login_token(&conn, "a@x.com").unwrap();

    let deleted = queries::cleanup_expired_login_tokens(&conn).unwrap();

    assert_eq!(deleted, 1);
    assert!(queries::get_login_token(&conn, "stale").unwrap().is_none());
    assert!(queries::get_login_token(&conn, &live.token).unwrap().is_some());
}

// ============ HTTP surface ============

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn request_login_response_is_opaque() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_active_subscriber(&conn, "subscribed@x.com", "cus_1", "sub_1");
    }
    let app = app(state);

    let (status_a, body_a) = post_json(&app, "/request-login", json!({"email": "subscribed@x.com"})).await;
    let (status_b, body_b) = post_json(&app, "/request-login", json!({"email": "stranger@x.com"})).await;

    // Same acknowledgment either way; no token, no hint of existence.
    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(body_a, body_b);
    assert!(body_a.get("token").is_none());
}

#[tokio::test]
async fn request_login_rejects_malformed_email() {
    let app = app(create_test_app_state());

    let (status, _) = post_json(&app, "/request-login", json!({"email": "not-an-email"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn magic_login_with_unknown_token_is_401() {
    let app = app(create_test_app_state());

    let (status, body) = get(&app, "/magic-login/no-such-token").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn magic_login_with_expired_token_is_401() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        insert_login_token(&conn, "stale-token", "a@x.com", past_timestamp(1));
    }
    let app = app(state);

    let (status, _) = get(&app, "/magic-login/stale-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Replays stay 401 - the row is gone.
    let (status, _) = get(&app, "/magic-login/stale-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_then_checkout_then_status_scenario() {
    use subgate::handlers::webhooks::events::{apply, CheckoutData, WebhookEvent};

    let state = create_test_app_state();
    let app = app(state.clone());

    // No subscriber yet: a valid token logs in but is denied.
    let token = {
        let conn = state.db.get().unwrap();
        queries::issue_login_token(&conn, "a@x.com").unwrap()
    };
    let (status, body) = get(&app, &format!("/magic-login/{}", token.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "denied");
    assert_eq!(body["reason"], "no_subscription");

    let (_, body) = get(&app, "/status/a@x.com").await;
    assert_eq!(body["active"], false);

    // A checkout completion arrives for the email.
    {
        let conn = state.db.get().unwrap();
        apply(
            &conn,
            &WebhookEvent::CheckoutCompleted(CheckoutData {
                email: "a@x.com".to_string(),
                customer_id: Some("cus_1".to_string()),
                subscription_id: Some("sub_1".to_string()),
                status: SubscriptionStatus::Active,
                current_period_end: Some(future_timestamp(30)),
            }),
        )
        .unwrap();
    }

    let (status, body) = get(&app, "/status/a@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], true);

    // A fresh token now grants access (the first one was consumed).
    let token = {
        let conn = state.db.get().unwrap();
        queries::issue_login_token(&conn, "a@x.com").unwrap()
    };
    let (status, body) = get(&app, &format!("/magic-login/{}", token.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "ok");
    assert_eq!(body["email"], "a@x.com");
}
