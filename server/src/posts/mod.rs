//! Blog content module: posts, comments, and likes.
//!
//! Every handler gates disclosure and mutation through the access
//! evaluator (`crate::access`) before touching the datastore:
//! - post read/write use `read_allowed` / `write_allowed`
//! - commenting and liking require read access to the parent post
//! - comment/like mutation is restricted to the record's own author

pub mod comments;
pub mod handlers;
pub mod likes;
pub mod queries;
pub mod router;
pub mod types;

pub use router::{comments_router, likes_router, posts_router};
pub use types::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Error type shared by post, comment, and like handlers.
#[derive(Debug)]
pub enum PostError {
    /// Post does not exist.
    NotFound,
    /// Comment does not exist.
    CommentNotFound,
    /// No like by this user on this post.
    LikeNotFound,
    /// Referenced user does not exist.
    UserNotFound,
    /// The requester may not perform this operation.
    Forbidden,
    /// The requester already liked this post.
    AlreadyLiked,
    /// Page number past the end of the result set.
    InvalidPage,
    /// Request body failed validation.
    Validation(String),
    /// Database failure.
    Database(sqlx::Error),
}

impl IntoResponse for PostError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "Post not found"),
            Self::CommentNotFound => (StatusCode::NOT_FOUND, "Comment not found"),
            Self::LikeNotFound => (StatusCode::NOT_FOUND, "Like not found"),
            Self::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Access denied"),
            Self::AlreadyLiked => (StatusCode::CONFLICT, "Post already liked"),
            Self::InvalidPage => (StatusCode::NOT_FOUND, "Invalid page"),
            Self::Validation(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": msg })),
                )
                    .into_response()
            }
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for PostError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}
