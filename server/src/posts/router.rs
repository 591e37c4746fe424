//! Blog route definitions.

use axum::routing::{get, put};
use axum::Router;

use super::{comments, handlers, likes};
use crate::api::AppState;

/// Routes mounted at `/api/posts`.
pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_posts).post(handlers::create_post))
        .route(
            "/{id}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/{id}/comments",
            get(comments::list_post_comments).post(comments::create_comment),
        )
        .route(
            "/{id}/likes",
            get(likes::list_post_likes)
                .post(likes::like_post)
                .delete(likes::unlike_post),
        )
}

/// Routes mounted at `/api/comments`.
pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(comments::list_all_comments))
        .route("/user/{user_id}", get(comments::list_user_comments))
        .route(
            "/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
}

/// Routes mounted at `/api/likes`.
pub fn likes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(likes::list_all_likes))
        .route("/user/{user_id}", get(likes::list_user_likes))
}
