use serde::Deserialize;

use crate::error::{AppError, Result};

/// How long an issued login link stays redeemable.
pub const LOGIN_TOKEN_TTL_SECS: i64 = 15 * 60;

/// A single-use login token bound to an email.
///
/// Consumed (deleted) on the first redemption attempt that finds it,
/// whether that attempt succeeds or hits the expiry check.
#[derive(Debug, Clone)]
pub struct LoginToken {
    pub token: String,
    pub email: String,
    pub expires_at: i64,
    pub created_at: i64,
}

/// Outcome of redeeming a token that was found and unexpired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entitlement {
    Granted { email: String },
    /// No subscriber row for the email, or its status is not active.
    Denied { email: String },
}

#[derive(Debug, Deserialize)]
pub struct RequestLogin {
    pub email: String,
}

impl RequestLogin {
    pub fn validate(&self) -> Result<()> {
        validate_email_format(&self.email)
    }
}

/// Basic email format validation.
///
/// Intentionally permissive - one @, non-empty local part, dotted domain.
/// The address is a delivery target, not an account reference, so this is
/// a sanity check rather than RFC 5322 compliance.
fn validate_email_format(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(AppError::BadRequest("Email must not be empty".into()));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }

    let local_part = parts[0];
    let domain_part = parts[1];

    if local_part.is_empty() || local_part.contains(' ') {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }

    if domain_part.is_empty()
        || !domain_part.contains('.')
        || domain_part.starts_with('.')
        || domain_part.ends_with('.')
    {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }

    Ok(())
}
