mod login_token;
mod subscriber;

pub use login_token::*;
pub use subscriber::*;

use serde::{Deserialize, Serialize};

/// Stripe credentials and the default subscription price.
/// Loaded once at startup from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Price ID (price_xxx) used when checkout is started without one.
    pub price_id: String,
}
