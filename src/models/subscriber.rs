use serde::{Deserialize, Serialize};

/// Subscription lifecycle state as reconciled from payment events.
///
/// Entitlement is derived, never stored: only `Active` grants access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }

    /// Map a Stripe subscription status onto our three states.
    ///
    /// Checkout completion already means a payment happened, so the
    /// in-between Stripe states (`incomplete`, `unpaid`, ...) land on
    /// `past_due`: recoverable by the next paid invoice, never entitled.
    pub fn from_stripe(s: &str) -> Self {
        match s {
            "active" | "trialing" => SubscriptionStatus::Active,
            "canceled" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::PastDue,
        }
    }
}

/// One row per email. Created by the first checkout completion, updated in
/// place by every later event, never deleted - cancellation is a status
/// transition.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub email: String,
    pub status: SubscriptionStatus,
    /// Stripe customer ID (cus_xxx). Stable once set; invoice events
    /// correlate on this, not on email.
    pub stripe_customer_id: Option<String>,
    /// Stripe subscription ID (sub_xxx). Cancellation events correlate
    /// on this.
    pub stripe_subscription_id: Option<String>,
    /// End of the paid period (Unix seconds). Informational - entitlement
    /// expiry is event-driven, not time-driven.
    pub current_period_end: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Subscriber {
    pub fn is_entitled(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}
