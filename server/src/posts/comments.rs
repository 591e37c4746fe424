//! Comment HTTP Handlers
//!
//! Commenting requires read access to the parent post. Editing or
//! deleting a comment is restricted to the comment's own author; not
//! even superusers may rewrite someone else's words.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::handlers::load_readable_post;
use super::queries;
use super::types::{
    paginate, CommentBodyRequest, CommentRecord, CommentResponse, PageQuery, Paginated,
    COMMENTS_PAGE_SIZE,
};
use super::PostError;
use crate::access::{self, Requester};
use crate::api::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::db::find_user_by_id;

/// Comment on a post.
///
/// POST /api/posts/{id}/comments
#[tracing::instrument(skip(state, body), fields(user_id = %auth_user.id, post_id = %post_id))]
pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(body): Json<CommentBodyRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), PostError> {
    body.validate()
        .map_err(|e| PostError::Validation(e.to_string()))?;

    let requester = auth_user.requester();
    let post = load_readable_post(&state, &requester, post_id).await?;

    let comment = queries::create_comment(&state.db, post.id, auth_user.id, &body.content).await?;

    tracing::info!(comment_id = %comment.id, "Comment created");

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: comment.id,
            post: comment.post_id,
            author_name: auth_user.username,
            content: comment.content,
            created_at: comment.created_at,
        }),
    ))
}

/// List a post's comments, newest first.
///
/// GET /api/posts/{id}/comments
pub async fn list_post_comments(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(post_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<CommentResponse>>, PostError> {
    let requester = maybe_user.requester();
    let post = load_readable_post(&state, &requester, post_id).await?;

    let comments = queries::list_comments(&state.db, Some(post.id), None).await?;

    respond_page(comments, &query)
}

/// List every comment on posts the requester can read.
///
/// GET /api/comments
pub async fn list_all_comments(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<CommentResponse>>, PostError> {
    let requester = maybe_user.requester();

    let comments = visible_comments(&state, &requester, None).await?;

    respond_page(comments, &query)
}

/// List a user's comments on posts the requester can read.
///
/// GET /api/comments/user/{user_id}
pub async fn list_user_comments(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<CommentResponse>>, PostError> {
    find_user_by_id(&state.db, user_id)
        .await?
        .ok_or(PostError::UserNotFound)?;

    let requester = maybe_user.requester();
    let comments = visible_comments(&state, &requester, Some(user_id)).await?;

    respond_page(comments, &query)
}

/// Edit a comment. Author only.
///
/// PUT /api/comments/{id}
#[tracing::instrument(skip(state, body), fields(user_id = %auth_user.id, comment_id = %id))]
pub async fn update_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentBodyRequest>,
) -> Result<Json<CommentResponse>, PostError> {
    body.validate()
        .map_err(|e| PostError::Validation(e.to_string()))?;

    let comment = queries::find_comment_by_id(&state.db, id)
        .await?
        .ok_or(PostError::CommentNotFound)?;

    if !access::owns_record(&auth_user.requester(), comment.author_id) {
        return Err(PostError::Forbidden);
    }

    let updated = queries::update_comment(&state.db, comment.id, &body.content).await?;

    tracing::info!("Comment updated");

    Ok(Json(CommentResponse {
        id: updated.id,
        post: updated.post_id,
        author_name: auth_user.username,
        content: updated.content,
        created_at: updated.created_at,
    }))
}

/// Delete a comment. Author only.
///
/// DELETE /api/comments/{id}
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id, comment_id = %id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, PostError> {
    let comment = queries::find_comment_by_id(&state.db, id)
        .await?
        .ok_or(PostError::CommentNotFound)?;

    if !access::owns_record(&auth_user.requester(), comment.author_id) {
        return Err(PostError::Forbidden);
    }

    queries::delete_comment(&state.db, comment.id).await?;

    tracing::info!("Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Fetch comments and drop those on posts the requester cannot read.
async fn visible_comments(
    state: &AppState,
    requester: &Requester,
    author_id: Option<Uuid>,
) -> Result<Vec<CommentRecord>, PostError> {
    let comments = queries::list_comments(&state.db, None, author_id)
        .await?
        .into_iter()
        .filter(|record| access::read_allowed(requester, &record.post_visibility()))
        .collect();

    Ok(comments)
}

fn respond_page(
    comments: Vec<CommentRecord>,
    query: &PageQuery,
) -> Result<Json<Paginated<CommentResponse>>, PostError> {
    let page = paginate(
        comments,
        query.page(),
        query.page_size(COMMENTS_PAGE_SIZE),
    )
    .ok_or(PostError::InvalidPage)?;

    Ok(Json(Paginated {
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_count: page.total_count,
        next: page.next,
        previous: page.previous,
        results: page.results.into_iter().map(Into::into).collect(),
    }))
}
