use axum::{body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::payments::StripeClient;

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    /// Stripe Price ID; falls back to the configured default.
    #[serde(default)]
    pub price_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// POST /create-checkout-session - start a hosted Stripe checkout.
///
/// The body is optional; an empty POST buys the default price. Processor
/// failures surface as 500 with the upstream message and are not retried
/// here.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>> {
    let request: CheckoutRequest = if body.is_empty() {
        CheckoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?
    };

    let price_id = request
        .price_id
        .unwrap_or_else(|| state.stripe.price_id.clone());

    let client = StripeClient::new(&state.stripe);
    let (session_id, url) = client
        .create_checkout_session(&price_id, &state.success_url, &state.cancel_url)
        .await?;

    tracing::debug!("created checkout session {} for price {}", session_id, price_id);

    Ok(Json(CheckoutResponse { url }))
}
