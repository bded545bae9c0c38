use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{NewPost, Post, Thread, ThreadUpdate, Vote};

use crate::error::ApiResult;
use crate::params::PostsParams;
use crate::state::AppState;

/// `POST /thread/{slug_or_id}/create` with a JSON array of posts.
pub async fn create_posts(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    body: Result<Json<Vec<NewPost>>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Vec<Post>>)> {
    let Json(posts) = body?;
    let created = state.services.threads.create_posts(&slug_or_id, posts).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /thread/{slug_or_id}/details`
pub async fn get_thread(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    Ok(Json(state.services.threads.get_thread(&slug_or_id).await?))
}

/// `POST /thread/{slug_or_id}/details`
pub async fn update_thread(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    body: Result<Json<ThreadUpdate>, JsonRejection>,
) -> ApiResult<Json<Thread>> {
    let Json(update) = body?;
    Ok(Json(
        state.services.threads.update_thread(&slug_or_id, update).await?,
    ))
}

/// `GET /thread/{slug_or_id}/posts?limit&since&sort&desc`
pub async fn list_posts(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    params: Result<Query<PostsParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Post>>> {
    let Query(params) = params?;
    let posts = state
        .services
        .threads
        .list_posts(&slug_or_id, params.into_query()?)
        .await?;
    Ok(Json(posts))
}

/// `POST /thread/{slug_or_id}/vote`
pub async fn vote(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    body: Result<Json<Vote>, JsonRejection>,
) -> ApiResult<Json<Thread>> {
    let Json(vote) = body?;
    Ok(Json(state.services.threads.vote(&slug_or_id, vote).await?))
}
