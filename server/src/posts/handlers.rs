//! Post HTTP Handlers
//!
//! Reads are gated by `read_allowed`, mutations by `write_allowed`.
//! Denied access on an existing post is a 403, never a silent 404, so
//! clients can distinguish "hidden from you" from "gone".

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::queries;
use super::types::{
    paginate, CreatePostRequest, PageQuery, Paginated, Post, PostDetail, PostListItem,
    UpdatePostRequest, excerpt, POSTS_PAGE_SIZE,
};
use super::PostError;
use crate::access::{self, PermissionTier, Requester};
use crate::api::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::db::find_users_by_ids;

/// Create a new post.
///
/// POST /api/posts
#[tracing::instrument(skip(state, body), fields(author_id = %auth_user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostDetail>), PostError> {
    body.validate()
        .map_err(|e| PostError::Validation(e.to_string()))?;

    let post = queries::create_post(
        &state.db,
        auth_user.id,
        &auth_user.team,
        &body.title,
        &body.content,
        body.is_public.unwrap_or(true),
        body.authenticated_permission
            .unwrap_or(PermissionTier::ReadOnly),
        body.group_permission.unwrap_or(PermissionTier::ReadOnly),
    )
    .await?;

    tracing::info!(post_id = %post.id, "Post created");

    let requester = auth_user.requester();
    let detail = build_post_detail(&state, &requester, post).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List posts visible to the requester, newest first.
///
/// GET /api/posts
pub async fn list_posts(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<PostListItem>>, PostError> {
    let requester = maybe_user.requester();

    let visible: Vec<Post> = queries::list_posts(&state.db)
        .await?
        .into_iter()
        .filter(|post| access::read_allowed(&requester, &post.visibility()))
        .collect();

    let page = paginate(visible, query.page(), query.page_size(POSTS_PAGE_SIZE))
        .ok_or(PostError::InvalidPage)?;

    // Bulk-resolve author names and engagement counts for this page only.
    let post_ids: Vec<Uuid> = page.results.iter().map(|p| p.id).collect();
    let author_ids: Vec<Uuid> = page.results.iter().map(|p| p.author_id).collect();

    let authors: HashMap<Uuid, String> = find_users_by_ids(&state.db, &author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();
    let comment_counts: HashMap<Uuid, i64> =
        queries::count_comments_for_posts(&state.db, &post_ids)
            .await?
            .into_iter()
            .collect();
    let like_counts: HashMap<Uuid, i64> = queries::count_likes_for_posts(&state.db, &post_ids)
        .await?
        .into_iter()
        .collect();

    let results = page
        .results
        .into_iter()
        .map(|post| {
            let level = access::permission_level(&requester, &post.visibility());
            PostListItem {
                id: post.id,
                author: authors.get(&post.author_id).cloned().unwrap_or_default(),
                title: post.title,
                excerpt: excerpt(&post.content),
                likes: like_counts.get(&post.id).copied().unwrap_or(0),
                comments: comment_counts.get(&post.id).copied().unwrap_or(0),
                team: post.team,
                is_public: post.is_public,
                authenticated_permission: post.authenticated_permission,
                group_permission: post.group_permission,
                permission_level: level,
                created_at: post.created_at,
                updated_at: post.updated_at,
            }
        })
        .collect();

    Ok(Json(Paginated {
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_count: page.total_count,
        next: page.next,
        previous: page.previous,
        results,
    }))
}

/// Fetch a single post with its comments and likes.
///
/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PostDetail>, PostError> {
    let requester = maybe_user.requester();
    let post = load_readable_post(&state, &requester, id).await?;

    let detail = build_post_detail(&state, &requester, post).await?;
    Ok(Json(detail))
}

/// Update a post.
///
/// Requires write access. Absent fields keep their stored values;
/// author and team are never touched.
///
/// PUT /api/posts/{id}
#[tracing::instrument(skip(state, body), fields(user_id = %auth_user.id, post_id = %id))]
pub async fn update_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<PostDetail>, PostError> {
    body.validate()
        .map_err(|e| PostError::Validation(e.to_string()))?;

    let requester = auth_user.requester();
    let post = load_writable_post(&state, &requester, id).await?;

    let updated = queries::update_post(
        &state.db,
        post.id,
        body.title.as_deref().unwrap_or(&post.title),
        body.content.as_deref().unwrap_or(&post.content),
        body.is_public.unwrap_or(post.is_public),
        body.authenticated_permission
            .unwrap_or(post.authenticated_permission),
        body.group_permission.unwrap_or(post.group_permission),
    )
    .await?;

    tracing::info!("Post updated");

    let detail = build_post_detail(&state, &requester, updated).await?;
    Ok(Json(detail))
}

/// Delete a post and its comments and likes.
///
/// DELETE /api/posts/{id}
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id, post_id = %id))]
pub async fn delete_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, PostError> {
    let requester = auth_user.requester();
    let post = load_writable_post(&state, &requester, id).await?;

    queries::delete_post(&state.db, post.id).await?;

    tracing::info!("Post deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Load a post, enforcing read access: 404 when missing, 403 when the
/// requester may not see it.
pub(super) async fn load_readable_post(
    state: &AppState,
    requester: &Requester,
    id: Uuid,
) -> Result<Post, PostError> {
    let post = queries::find_post_by_id(&state.db, id)
        .await?
        .ok_or(PostError::NotFound)?;

    if !access::read_allowed(requester, &post.visibility()) {
        return Err(PostError::Forbidden);
    }

    Ok(post)
}

/// Load a post, enforcing write access.
async fn load_writable_post(
    state: &AppState,
    requester: &Requester,
    id: Uuid,
) -> Result<Post, PostError> {
    let post = queries::find_post_by_id(&state.db, id)
        .await?
        .ok_or(PostError::NotFound)?;

    if !access::write_allowed(requester, &post.visibility()) {
        return Err(PostError::Forbidden);
    }

    Ok(post)
}

/// Assemble the full detail view: author name, embedded comments and
/// likes, and the requester's evaluated access level.
async fn build_post_detail(
    state: &AppState,
    requester: &Requester,
    post: Post,
) -> Result<PostDetail, PostError> {
    let author = crate::db::find_user_by_id(&state.db, post.author_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();

    let comments = queries::list_comments(&state.db, Some(post.id), None)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let likes = queries::list_likes(&state.db, Some(post.id), None)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let level = access::permission_level(requester, &post.visibility());

    Ok(PostDetail {
        id: post.id,
        author,
        title: post.title,
        content: post.content,
        team: post.team,
        is_public: post.is_public,
        authenticated_permission: post.authenticated_permission,
        group_permission: post.group_permission,
        permission_level: level,
        comments,
        likes,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}
