use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{User, UserProfile, UserUpdate};

use crate::error::ApiResult;
use crate::state::AppState;

/// `POST /user/{nickname}/create`
pub async fn create_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    body: Result<Json<UserProfile>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(profile) = body?;
    let user = state.services.users.create_user(&nickname, profile).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /user/{nickname}/profile`
pub async fn get_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.services.users.get_user(&nickname).await?))
}

/// `POST /user/{nickname}/profile`
pub async fn update_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(update) = body?;
    Ok(Json(state.services.users.update_user(&nickname, update).await?))
}
