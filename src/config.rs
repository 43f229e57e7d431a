use std::env;

use crate::models::StripeConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub stripe: StripeConfig,
    pub success_url: String,
    pub cancel_url: String,
    pub dev_mode: bool,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// The Stripe secrets are required; everything else has a sensible
    /// local default. Panics at startup on missing secrets rather than
    /// limping along and rejecting every webhook later.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("SUBGATE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let stripe = StripeConfig {
            secret_key: env::var("STRIPE_SECRET_KEY")
                .expect("STRIPE_SECRET_KEY must be set"),
            webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .expect("STRIPE_WEBHOOK_SECRET must be set"),
            price_id: env::var("STRIPE_PRICE_ID")
                .expect("STRIPE_PRICE_ID must be set"),
        };

        let success_url = env::var("CHECKOUT_SUCCESS_URL")
            .unwrap_or_else(|_| format!("{}/success.html", base_url));
        let cancel_url = env::var("CHECKOUT_CANCEL_URL")
            .unwrap_or_else(|_| format!("{}/cancel.html", base_url));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "subgate.db".to_string()),
            base_url,
            stripe,
            success_url,
            cancel_url,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
