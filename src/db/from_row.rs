//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{LoginToken, Subscriber, SubscriptionStatus};

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` helper, reducing
/// repetitive row mapping closures.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

// ============ SQL SELECT Constants ============

pub const LOGIN_TOKEN_COLS: &str = "token, email, expires_at, created_at";

pub const SUBSCRIBER_COLS: &str = "email, status, stripe_customer_id, stripe_subscription_id, current_period_end, created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for LoginToken {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LoginToken {
            token: row.get(0)?,
            email: row.get(1)?,
            expires_at: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for Subscriber {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // Graceful failure on corrupt status values instead of a panic.
        let status: String = row.get(1)?;
        let status = SubscriptionStatus::from_str(&status).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(1, "status".to_string(), rusqlite::types::Type::Text)
        })?;
        Ok(Subscriber {
            email: row.get(0)?,
            status,
            stripe_customer_id: row.get(2)?,
            stripe_subscription_id: row.get(3)?,
            current_period_end: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}
