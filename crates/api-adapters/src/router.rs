use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{forums, posts, service, threads, users};
use crate::middleware::{cors_policy, propagate_request_id, set_request_id, trace_layer};
use crate::state::AppState;

/// Builds the complete forum API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/user/{nickname}/create", post(users::create_user))
        .route(
            "/user/{nickname}/profile",
            get(users::get_user).post(users::update_user),
        )
        .route("/forum/create", post(forums::create_forum))
        .route("/forum/{slug}/details", get(forums::get_forum))
        .route("/forum/{slug}/create", post(forums::create_thread))
        .route("/forum/{slug}/threads", get(forums::list_threads))
        .route("/forum/{slug}/users", get(forums::list_users))
        .route("/thread/{slug_or_id}/create", post(threads::create_posts))
        .route(
            "/thread/{slug_or_id}/details",
            get(threads::get_thread).post(threads::update_thread),
        )
        .route("/thread/{slug_or_id}/posts", get(threads::list_posts))
        .route("/thread/{slug_or_id}/vote", post(threads::vote))
        .route(
            "/post/{id}/details",
            get(posts::get_post).post(posts::update_post),
        )
        .route("/service/status", get(service::status))
        .route("/service/clear", post(service::clear))
        .layer(propagate_request_id())
        .layer(trace_layer())
        .layer(cors_policy())
        .layer(set_request_id())
        .with_state(state)
}
