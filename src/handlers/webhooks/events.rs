//! Provider-agnostic subscription events and their application to the store.
//!
//! `apply` is the reconciliation core: a state transition per event kind,
//! each one an upsert or update keyed by a stable identifier. Replays of
//! the same event land on the same key with the same values (idempotent),
//! and events for one subscriber may arrive in any order - each arm
//! asserts only what its own event says, never that prior state is fresh.
//! Last write wins; processor sequence numbers are deliberately unused.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::SubscriptionStatus;

/// Data extracted from a checkout completion, after the authoritative
/// subscription lookup has filled in status and period end.
#[derive(Debug, Clone)]
pub struct CheckoutData {
    pub email: String,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<i64>,
}

/// Parsed webhook event. Unknown event types land on `Ignored`, which is
/// acknowledged like everything else so the processor stops redelivering.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// First (or repeated) checkout completion - upserts the subscriber row.
    CheckoutCompleted(CheckoutData),
    /// Renewal or initial invoice settled - subscriber becomes active.
    InvoicePaid {
        customer_id: String,
        period_end: Option<i64>,
    },
    /// A charge failed - subscriber is past due until an invoice clears.
    InvoicePaymentFailed { customer_id: String },
    /// Subscription ended at the processor.
    SubscriptionCanceled { subscription_id: String },
    /// Authenticated but irrelevant to subscription state.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The correlation id matched no subscriber. Events can outrun the
    /// checkout that creates the row; this is a no-op, not an error.
    NoMatch,
    Ignored,
}

/// Apply one event to the subscription store.
pub fn apply(conn: &Connection, event: &WebhookEvent) -> Result<ApplyOutcome> {
    match event {
        WebhookEvent::CheckoutCompleted(data) => {
            queries::upsert_subscriber_from_checkout(
                conn,
                &data.email,
                data.customer_id.as_deref(),
                data.subscription_id.as_deref(),
                data.status,
                data.current_period_end,
            )?;
            Ok(ApplyOutcome::Applied)
        }
        WebhookEvent::InvoicePaid {
            customer_id,
            period_end,
        } => {
            let matched = queries::set_status_by_customer(
                conn,
                customer_id,
                SubscriptionStatus::Active,
                *period_end,
            )?;
            Ok(if matched { ApplyOutcome::Applied } else { ApplyOutcome::NoMatch })
        }
        WebhookEvent::InvoicePaymentFailed { customer_id } => {
            let matched = queries::set_status_by_customer(
                conn,
                customer_id,
                SubscriptionStatus::PastDue,
                None,
            )?;
            Ok(if matched { ApplyOutcome::Applied } else { ApplyOutcome::NoMatch })
        }
        WebhookEvent::SubscriptionCanceled { subscription_id } => {
            let matched = queries::set_status_by_subscription(
                conn,
                subscription_id,
                SubscriptionStatus::Canceled,
            )?;
            Ok(if matched { ApplyOutcome::Applied } else { ApplyOutcome::NoMatch })
        }
        WebhookEvent::Ignored => Ok(ApplyOutcome::Ignored),
    }
}
