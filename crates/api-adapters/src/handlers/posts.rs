use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{Post, PostDetails, PostUpdate};

use crate::error::ApiResult;
use crate::params::DetailsParams;
use crate::state::AppState;

/// `GET /post/{id}/details?related=user,thread,forum`
pub async fn get_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<DetailsParams>, QueryRejection>,
) -> ApiResult<Json<PostDetails>> {
    let Path(id) = id?;
    let Query(params) = params?;
    let details = state.services.posts.details(id, &params.related()).await?;
    Ok(Json(details))
}

/// `POST /post/{id}/details`
pub async fn update_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PostUpdate>, JsonRejection>,
) -> ApiResult<Json<Post>> {
    let Path(id) = id?;
    let Json(update) = body?;
    Ok(Json(state.services.posts.update_post(id, update).await?))
}
