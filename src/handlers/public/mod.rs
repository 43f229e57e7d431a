mod checkout;
mod login;
mod status;

pub use checkout::*;
pub use login::*;
pub use status::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/request-login", post(request_login))
        .route("/magic-login/{token}", get(magic_login))
        .route("/status/{email}", get(subscription_status))
        .route("/create-checkout-session", post(create_checkout_session))
}
