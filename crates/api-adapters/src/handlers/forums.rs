use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Forum, NewForum, NewThread, Thread, User};

use crate::error::ApiResult;
use crate::params::{ThreadsParams, UsersParams};
use crate::state::AppState;

/// `POST /forum/create`
pub async fn create_forum(
    State(state): State<AppState>,
    body: Result<Json<NewForum>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Forum>)> {
    let Json(new) = body?;
    let forum = state.services.forums.create_forum(new).await?;
    Ok((StatusCode::CREATED, Json(forum)))
}

/// `GET /forum/{slug}/details`
pub async fn get_forum(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Forum>> {
    Ok(Json(state.services.forums.get_forum(&slug).await?))
}

/// `POST /forum/{slug}/create`
pub async fn create_thread(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Result<Json<NewThread>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Thread>)> {
    let Json(new) = body?;
    let thread = state.services.forums.create_thread(&slug, new).await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

/// `GET /forum/{slug}/threads?limit&since&desc`
pub async fn list_threads(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    params: Result<Query<ThreadsParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Thread>>> {
    let Query(params) = params?;
    let threads = state
        .services
        .forums
        .list_threads(&slug, params.into_query()?)
        .await?;
    Ok(Json(threads))
}

/// `GET /forum/{slug}/users?limit&since&desc`
pub async fn list_users(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    params: Result<Query<UsersParams>, QueryRejection>,
) -> ApiResult<Json<Vec<User>>> {
    let Query(params) = params?;
    let users = state
        .services
        .forums
        .list_users(&slug, params.into_query()?)
        .await?;
    Ok(Json(users))
}
