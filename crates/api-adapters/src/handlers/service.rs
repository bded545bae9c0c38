use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::Status;

use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /service/status`
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<Status>> {
    Ok(Json(state.services.maintenance.status().await?))
}

/// `POST /service/clear`
pub async fn clear(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.services.maintenance.clear().await?;
    Ok(StatusCode::OK)
}
