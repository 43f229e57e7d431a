use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::SubscriptionStatus;
use crate::payments::{
    StripeCheckoutSession, StripeClient, StripeInvoice, StripeSubscription, StripeWebhookEvent,
};

use super::events::{self, ApplyOutcome, CheckoutData, WebhookEvent};

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// POST /webhook - Stripe event intake.
///
/// Order is load-bearing: signature verification runs over the raw body
/// BEFORE any deserialization, so a forged payload never reaches the
/// parser. Everything after authentication acknowledges with 200 - even
/// unrecognized event types - because any other answer makes Stripe
/// redeliver forever.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::BadSignature)?;

    let client = StripeClient::new(&state.stripe);
    if !client.verify_webhook_signature(&body, signature)? {
        return Err(AppError::BadSignature);
    }

    let event = parse_event(&body)?;
    let event = resolve_checkout(&client, event).await?;

    let conn = state.db.get()?;
    match events::apply(&conn, &event)? {
        ApplyOutcome::Applied => tracing::info!("applied webhook event: {}", event_label(&event)),
        ApplyOutcome::NoMatch => {
            tracing::warn!("webhook event matched no subscriber: {}", event_label(&event))
        }
        ApplyOutcome::Ignored => {}
    }

    Ok(Json(WebhookAck { status: "ok" }))
}

fn event_label(event: &WebhookEvent) -> &'static str {
    match event {
        WebhookEvent::CheckoutCompleted(_) => "checkout_completed",
        WebhookEvent::InvoicePaid { .. } => "invoice_paid",
        WebhookEvent::InvoicePaymentFailed { .. } => "invoice_payment_failed",
        WebhookEvent::SubscriptionCanceled { .. } => "subscription_canceled",
        WebhookEvent::Ignored => "ignored",
    }
}

/// Parse an authenticated payload into a tagged event.
///
/// Unknown event types are the default arm, not an error.
fn parse_event(body: &[u8]) -> Result<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedPayload(e.to_string()))?;

    match event.event_type.as_str() {
        "checkout.session.completed" => parse_checkout_completed(&event),
        "invoice.paid" => parse_invoice(&event).map(|inv| match inv.customer {
            Some(customer_id) => WebhookEvent::InvoicePaid {
                customer_id,
                period_end: inv.period_end,
            },
            None => WebhookEvent::Ignored,
        }),
        "invoice.payment_failed" => parse_invoice(&event).map(|inv| match inv.customer {
            Some(customer_id) => WebhookEvent::InvoicePaymentFailed { customer_id },
            None => WebhookEvent::Ignored,
        }),
        "customer.subscription.deleted" => {
            let subscription: StripeSubscription =
                serde_json::from_value(event.data.object.clone())
                    .map_err(|e| AppError::MalformedPayload(e.to_string()))?;
            Ok(WebhookEvent::SubscriptionCanceled {
                subscription_id: subscription.id,
            })
        }
        other => {
            tracing::debug!("ignoring stripe event type: {}", other);
            Ok(WebhookEvent::Ignored)
        }
    }
}

fn parse_checkout_completed(event: &StripeWebhookEvent) -> Result<WebhookEvent> {
    let session: StripeCheckoutSession = serde_json::from_value(event.data.object.clone())
        .map_err(|e| AppError::MalformedPayload(e.to_string()))?;

    // A checkout without any email can't be correlated to an identity.
    // Acknowledge and move on; failing would only make Stripe retry an
    // event we will never be able to process.
    let Some(email) = session.email() else {
        tracing::warn!("checkout session {} completed without an email", session.id);
        return Ok(WebhookEvent::Ignored);
    };

    Ok(WebhookEvent::CheckoutCompleted(CheckoutData {
        email: email.to_string(),
        customer_id: session.customer.clone(),
        subscription_id: session.subscription.clone(),
        // Placeholder until resolve_checkout fetches the authoritative
        // status; stays Active when the session has no subscription id.
        status: SubscriptionStatus::Active,
        current_period_end: None,
    }))
}

fn parse_invoice(event: &StripeWebhookEvent) -> Result<StripeInvoice> {
    serde_json::from_value(event.data.object.clone())
        .map_err(|e| AppError::MalformedPayload(e.to_string()))
}

/// Fill in authoritative status and period end for a checkout completion.
///
/// The checkout event reports that payment happened, not whether the
/// subscription landed on `trialing` or `active` - only the subscription
/// object knows. A failed fetch propagates as an error (500), which makes
/// Stripe redeliver the event and retry the lookup.
async fn resolve_checkout(client: &StripeClient, event: WebhookEvent) -> Result<WebhookEvent> {
    match event {
        WebhookEvent::CheckoutCompleted(mut data) => {
            if let Some(ref subscription_id) = data.subscription_id {
                let subscription = client.get_subscription(subscription_id).await?;
                data.status = SubscriptionStatus::from_stripe(&subscription.status);
                data.current_period_end = subscription.current_period_end;
                if data.customer_id.is_none() {
                    data.customer_id = subscription.customer.clone();
                }
            }
            Ok(WebhookEvent::CheckoutCompleted(data))
        }
        other => Ok(other),
    }
}
