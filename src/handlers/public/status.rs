use axum::extract::State;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Path};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active: bool,
}

/// GET /status/{email} - current entitlement for an email.
pub async fn subscription_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<StatusResponse>> {
    let conn = state.db.get()?;
    let active = queries::is_entitled(&conn, &email)?;
    Ok(Json(StatusResponse { active }))
}
