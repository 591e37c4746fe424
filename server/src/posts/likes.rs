//! Like HTTP Handlers
//!
//! Liking requires read access to the post. Each user may like a post
//! once; a repeat like is a conflict, not a no-op. Unliking removes the
//! requester's own like only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::handlers::load_readable_post;
use super::queries;
use super::types::{paginate, LikeRecord, LikeResponse, PageQuery, Paginated, LIKES_PAGE_SIZE};
use super::PostError;
use crate::access::{self, Requester};
use crate::api::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::db::find_user_by_id;

/// Like a post.
///
/// POST /api/posts/{id}/likes
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id, post_id = %post_id))]
pub async fn like_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<(StatusCode, Json<LikeResponse>), PostError> {
    let requester = auth_user.requester();
    let post = load_readable_post(&state, &requester, post_id).await?;

    let like = queries::create_like(&state.db, post.id, auth_user.id)
        .await?
        .ok_or(PostError::AlreadyLiked)?;

    tracing::info!(like_id = %like.id, "Post liked");

    Ok((
        StatusCode::CREATED,
        Json(LikeResponse {
            id: like.id,
            post: like.post_id,
            author_name: auth_user.username,
            created_at: like.created_at,
        }),
    ))
}

/// Remove the requester's like from a post.
///
/// DELETE /api/posts/{id}/likes
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id, post_id = %post_id))]
pub async fn unlike_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<StatusCode, PostError> {
    let requester = auth_user.requester();
    let post = load_readable_post(&state, &requester, post_id).await?;

    let deleted = queries::delete_like(&state.db, post.id, auth_user.id).await?;
    if deleted == 0 {
        return Err(PostError::LikeNotFound);
    }

    tracing::info!("Post unliked");

    Ok(StatusCode::NO_CONTENT)
}

/// List a post's likes, newest first.
///
/// GET /api/posts/{id}/likes
pub async fn list_post_likes(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(post_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<LikeResponse>>, PostError> {
    let requester = maybe_user.requester();
    let post = load_readable_post(&state, &requester, post_id).await?;

    let likes = queries::list_likes(&state.db, Some(post.id), None).await?;

    respond_page(likes, &query)
}

/// List every like on posts the requester can read.
///
/// GET /api/likes
pub async fn list_all_likes(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<LikeResponse>>, PostError> {
    let requester = maybe_user.requester();

    let likes = visible_likes(&state, &requester, None).await?;

    respond_page(likes, &query)
}

/// List a user's likes on posts the requester can read.
///
/// GET /api/likes/user/{user_id}
pub async fn list_user_likes(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<LikeResponse>>, PostError> {
    find_user_by_id(&state.db, user_id)
        .await?
        .ok_or(PostError::UserNotFound)?;

    let requester = maybe_user.requester();
    let likes = visible_likes(&state, &requester, Some(user_id)).await?;

    respond_page(likes, &query)
}

/// Fetch likes and drop those on posts the requester cannot read.
async fn visible_likes(
    state: &AppState,
    requester: &Requester,
    author_id: Option<Uuid>,
) -> Result<Vec<LikeRecord>, PostError> {
    let likes = queries::list_likes(&state.db, None, author_id)
        .await?
        .into_iter()
        .filter(|record| access::read_allowed(requester, &record.post_visibility()))
        .collect();

    Ok(likes)
}

fn respond_page(
    likes: Vec<LikeRecord>,
    query: &PageQuery,
) -> Result<Json<Paginated<LikeResponse>>, PostError> {
    let page = paginate(likes, query.page(), query.page_size(LIKES_PAGE_SIZE))
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
