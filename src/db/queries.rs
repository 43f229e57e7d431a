use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::crypto::generate_login_token;
use crate::error::{AppError, Result};
use crate::models::{
    Entitlement, LoginToken, Subscriber, SubscriptionStatus, LOGIN_TOKEN_TTL_SECS,
};

use super::from_row::{query_one, LOGIN_TOKEN_COLS, SUBSCRIBER_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Emails act as correlation keys, so lookups and stores must agree on case
/// and whitespace.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ============ Login Tokens ============

/// Issue a fresh login token for an email.
///
/// Every call creates a new independent token; multiple live tokens per
/// email are allowed. The email is not checked against subscribers -
/// entitlement is decided at redemption time.
pub fn issue_login_token(conn: &Connection, email: &str) -> Result<LoginToken> {
    let now = now();
    let token = LoginToken {
        token: generate_login_token(),
        email: normalize_email(email),
        expires_at: now + LOGIN_TOKEN_TTL_SECS,
        created_at: now,
    };

    conn.execute(
        "INSERT INTO login_tokens (token, email, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![&token.token, &token.email, token.expires_at, token.created_at],
    )?;

    Ok(token)
}

/// Redeem a login token exactly once and decide entitlement.
///
/// Runs as a single transaction: the row is deleted before the entitlement
/// read is trusted, so a crash in between can never leave the token
/// redeemable twice. Expired tokens are deleted on the way out too - a
/// lingering expired row must never get another chance.
///
/// Not-found and already-redeemed are both `InvalidToken`; the two cases
/// are indistinguishable to the caller.
pub fn redeem_login_token(conn: &mut Connection, token: &str) -> Result<Entitlement> {
    let tx = conn.transaction()?;

    let row: Option<(String, i64)> = tx
        .query_row(
            "SELECT email, expires_at FROM login_tokens WHERE token = ?1",
            params![token],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((email, expires_at)) = row else {
        return Err(AppError::InvalidToken);
    };

    tx.execute("DELETE FROM login_tokens WHERE token = ?1", params![token])?;

    if now() > expires_at {
        tx.commit()?;
        return Err(AppError::TokenExpired);
    }

    let status: Option<String> = tx
        .query_row(
            "SELECT status FROM subscribers WHERE email = ?1",
            params![&email],
            |row| row.get(0),
        )
        .optional()?;

    tx.commit()?;

    match status.as_deref().and_then(SubscriptionStatus::from_str) {
        Some(SubscriptionStatus::Active) => Ok(Entitlement::Granted { email }),
        _ => Ok(Entitlement::Denied { email }),
    }
}

pub fn get_login_token(conn: &Connection, token: &str) -> Result<Option<LoginToken>> {
    query_one(
        conn,
        &format!("SELECT {} FROM login_tokens WHERE token = ?1", LOGIN_TOKEN_COLS),
        &[&token],
    )
}

/// Delete expired tokens. Redemption re-checks expiry itself, so this is
/// hygiene for the table, not a correctness mechanism.
pub fn cleanup_expired_login_tokens(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM login_tokens WHERE expires_at < ?1",
        params![now()],
    )?;
    Ok(deleted)
}

// ============ Subscribers ============

pub fn get_subscriber_by_email(conn: &Connection, email: &str) -> Result<Option<Subscriber>> {
    let email = normalize_email(email);
    query_one(
        conn,
        &format!("SELECT {} FROM subscribers WHERE email = ?1", SUBSCRIBER_COLS),
        &[&email],
    )
}

/// The one read the rest of the product depends on: is this email
/// currently entitled? Absence of a row means no.
pub fn is_entitled(conn: &Connection, email: &str) -> Result<bool> {
    Ok(get_subscriber_by_email(conn, email)?
        .map(|s| s.is_entitled())
        .unwrap_or(false))
}

/// Upsert a subscriber from a checkout completion.
///
/// Creates the row on first checkout, otherwise overwrites processor ids,
/// status, and period end. Last write wins on the email key, so replays of
/// the same event are idempotent.
pub fn upsert_subscriber_from_checkout(
    conn: &Connection,
    email: &str,
    customer_id: Option<&str>,
    subscription_id: Option<&str>,
    status: SubscriptionStatus,
    current_period_end: Option<i64>,
) -> Result<()> {
    let email = normalize_email(email);
    let now = now();
    conn.execute(
        "INSERT INTO subscribers (email, status, stripe_customer_id, stripe_subscription_id, current_period_end, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(email) DO UPDATE SET
             status = excluded.status,
             stripe_customer_id = excluded.stripe_customer_id,
             stripe_subscription_id = excluded.stripe_subscription_id,
             current_period_end = excluded.current_period_end,
             updated_at = excluded.updated_at",
        params![&email, status.as_str(), customer_id, subscription_id, current_period_end, now],
    )?;
    Ok(())
}

/// Set the status of the subscriber matching a Stripe customer id.
///
/// Returns false when no subscriber matches - invoice events can outrun
/// the checkout that creates the row, and that is a no-op, not an error.
pub fn set_status_by_customer(
    conn: &Connection,
    customer_id: &str,
    status: SubscriptionStatus,
    current_period_end: Option<i64>,
) -> Result<bool> {
    let affected = match current_period_end {
        Some(period_end) => conn.execute(
            "UPDATE subscribers SET status = ?1, current_period_end = ?2, updated_at = ?3
             WHERE stripe_customer_id = ?4",
            params![status.as_str(), period_end, now(), customer_id],
        )?,
        None => conn.execute(
            "UPDATE subscribers SET status = ?1, updated_at = ?2
             WHERE stripe_customer_id = ?3",
            params![status.as_str(), now(), customer_id],
        )?,
    };
    Ok(affected > 0)
}

/// Set the status of the subscriber matching a Stripe subscription id.
pub fn set_status_by_subscription(
    conn: &Connection,
    subscription_id: &str,
    status: SubscriptionStatus,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE subscribers SET status = ?1, updated_at = ?2
         WHERE stripe_subscription_id = ?3",
        params![status.as_str(), now(), subscription_id],
    )?;
    Ok(affected > 0)
}
