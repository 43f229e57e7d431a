use axum::extract::State;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::models::{Entitlement, RequestLogin};

#[derive(Debug, Serialize)]
pub struct RequestLoginResponse {
    pub message: &'static str,
}

/// POST /request-login - issue a magic-link token for an email.
///
/// The response is the same whether or not the email has a subscription,
/// an account, or anything else: the link itself travels out-of-band.
/// Here that delivery channel is the server log.
pub async fn request_login(
    State(state): State<AppState>,
    Json(body): Json<RequestLogin>,
) -> Result<Json<RequestLoginResponse>> {
    body.validate()?;

    let conn = state.db.get()?;
    let token = queries::issue_login_token(&conn, &body.email)?;

    tracing::info!(
        "magic login link for {}: {}/magic-login/{}",
        token.email,
        state.base_url,
        token.token
    );

    Ok(Json(RequestLoginResponse {
        message: "If the address can receive mail, a login link is on its way",
    }))
}

#[derive(Debug, Serialize)]
pub struct MagicLoginResponse {
    pub login: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// GET /magic-login/{token} - redeem a token, exactly once.
///
/// Invalid and expired tokens are 401s (via `AppError`); a valid token for
/// an email without an active subscription is a 200 with a denial, since
/// the login itself proved possession of the link.
pub async fn magic_login(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MagicLoginResponse>> {
    let mut conn = state.db.get()?;

    match queries::redeem_login_token(&mut conn, &token)? {
        Entitlement::Granted { email } => {
            tracing::info!("login ok for {}", email);
            Ok(Json(MagicLoginResponse {
                login: "ok",
                email: Some(email),
                reason: None,
            }))
        }
        Entitlement::Denied { email } => {
            tracing::info!("login denied for {}: no subscription", email);
            Ok(Json(MagicLoginResponse {
                login: "denied",
                email: None,
                reason: Some("no_subscription"),
            }))
        }
    }
}
