//! Test utilities and fixtures for Subgate integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};

pub use subgate::db::{init_db, queries, AppState};
pub use subgate::models::*;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Stripe config with a fixed webhook secret so tests can sign payloads
pub fn test_stripe_config() -> StripeConfig {
    StripeConfig {
        secret_key: "sk_test_xxx".to_string(),
        webhook_secret: "whsec_test_secret".to_string(),
        price_id: "price_test_xxx".to_string(),
    }
}

/// Create an AppState for testing with an in-memory database.
///
/// Pool size is 1: each :memory: connection is its own database, so a
/// single shared connection is what makes every handler see the same data.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        base_url: "http://localhost:3000".to_string(),
        stripe: test_stripe_config(),
        success_url: "http://localhost:3000/success.html".to_string(),
        cancel_url: "http://localhost:3000/cancel.html".to_string(),
    }
}

/// Create a Router with all endpoints, as wired in main
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(subgate::handlers::public::router())
        .merge(subgate::handlers::webhooks::router())
        .with_state(state)
}

/// Upsert an active subscriber with processor ids
pub fn create_active_subscriber(
    conn: &Connection,
    email: &str,
    customer_id: &str,
    subscription_id: &str,
) {
    queries::upsert_subscriber_from_checkout(
        conn,
        email,
        Some(customer_id),
        Some(subscription_id),
        SubscriptionStatus::Active,
        Some(future_timestamp(30)),
    )
    .expect("Failed to create test subscriber");
}

/// Insert a login token row directly, bypassing issuance (for expiry tests)
pub fn insert_login_token(conn: &Connection, token: &str, email: &str, expires_at: i64) {
    conn.execute(
        "INSERT INTO login_tokens (token, email, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![token, email, expires_at, now()],
    )
    .expect("Failed to insert test login token");
}

pub fn count_subscribers(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM subscribers", [], |row| row.get(0))
        .expect("Failed to count subscribers")
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Get a future timestamp (days from now)
pub fn future_timestamp(days: i64) -> i64 {
    now() + (days * 86400)
}

/// Get a past timestamp (days ago)
pub fn past_timestamp(days: i64) -> i64 {
    now() - (days * 86400)
}
