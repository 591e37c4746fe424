//! Post, Comment, and Like Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required). Comment
//! and like listings join the parent post's visibility columns so
//! callers can filter per requester without extra round trips.

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::types::{Comment, CommentRecord, Like, LikeRecord, Post};
use crate::access::PermissionTier;

/// Log and return a database error with context.
macro_rules! db_error {
    ($query:expr $(,)?) => {
        |e| {
            error!(query = $query, error = %e, "Database query failed");
            e
        }
    };
    ($query:expr, $($field:tt)+) => {
        |e| {
            error!(query = $query, $($field)+, error = %e, "Database query failed");
            e
        }
    };
}

/// Shared SELECT for comment listings: author username plus the parent
/// post's visibility columns.
const COMMENT_RECORD_SELECT: &str = r"
    SELECT c.id, c.post_id, c.author_id, u.username AS author_name,
           c.content, c.created_at, c.updated_at,
           p.author_id AS post_author_id, p.team AS post_team,
           p.is_public, p.authenticated_permission, p.group_permission
    FROM comments c
    JOIN users u ON u.id = c.author_id
    JOIN posts p ON p.id = c.post_id
";

/// Shared SELECT for like listings.
const LIKE_RECORD_SELECT: &str = r"
    SELECT l.id, l.post_id, l.author_id, u.username AS author_name,
           l.created_at,
           p.author_id AS post_author_id, p.team AS post_team,
           p.is_public, p.authenticated_permission, p.group_permission
    FROM likes l
    JOIN users u ON u.id = l.author_id
    JOIN posts p ON p.id = l.post_id
";

// ============================================================================
// Post Queries
// ============================================================================

/// Create a post. The team is stamped from the author at creation time.
#[allow(clippy::too_many_arguments)]
pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    team: &str,
    title: &str,
    content: &str,
    is_public: bool,
    authenticated_permission: PermissionTier,
    group_permission: PermissionTier,
) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(
        r"
        INSERT INTO posts (author_id, team, title, content, is_public,
                           authenticated_permission, group_permission)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        ",
    )
    .bind(author_id)
    .bind(team)
    .bind(title)
    .bind(content)
    .bind(is_public)
    .bind(authenticated_permission)
    .bind(group_permission)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_post", author_id = %author_id))
}

/// Find post by ID.
pub async fn find_post_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_post_by_id", post_id = %id))
}

/// List all posts, newest first. Visibility filtering happens in the
/// handler via the access evaluator.
pub async fn list_posts(pool: &PgPool) -> sqlx::Result<Vec<Post>> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_posts",))
}

/// Update a post's mutable fields. Author and team never change.
pub async fn update_post(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    content: &str,
    is_public: bool,
    authenticated_permission: PermissionTier,
    group_permission: PermissionTier,
) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(
        r"
        UPDATE posts
        SET title = $2, content = $3, is_public = $4,
            authenticated_permission = $5, group_permission = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(is_public)
    .bind(authenticated_permission)
    .bind(group_permission)
    .fetch_one(pool)
    .await
    .map_err(db_error!("update_post", post_id = %id))
}

/// Delete a post. Comments and likes cascade.
pub async fn delete_post(pool: &PgPool, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_post", post_id = %id))?;

    Ok(())
}

// ============================================================================
// Comment Queries
// ============================================================================

/// Create a comment on a post.
pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
) -> sqlx::Result<Comment> {
    sqlx::query_as::<_, Comment>(
        r"
        INSERT INTO comments (post_id, author_id, content)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_comment", post_id = %post_id, author_id = %author_id))
}

/// Find comment by ID.
pub async fn find_comment_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Comment>> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_comment_by_id", comment_id = %id))
}

/// Update a comment's content.
pub async fn update_comment(pool: &PgPool, id: Uuid, content: &str) -> sqlx::Result<Comment> {
    sqlx::query_as::<_, Comment>(
        r"
        UPDATE comments
        SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(content)
    .fetch_one(pool)
    .await
    .map_err(db_error!("update_comment", comment_id = %id))
}

/// Delete a comment.
pub async fn delete_comment(pool: &PgPool, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_comment", comment_id = %id))?;

    Ok(())
}

/// List comments, newest first, optionally scoped to a post and/or an
/// author.
pub async fn list_comments(
    pool: &PgPool,
    post_id: Option<Uuid>,
    author_id: Option<Uuid>,
) -> sqlx::Result<Vec<CommentRecord>> {
    let query = format!(
        r"{COMMENT_RECORD_SELECT}
        WHERE ($1::uuid IS NULL OR c.post_id = $1)
          AND ($2::uuid IS NULL OR c.author_id = $2)
        ORDER BY c.created_at DESC
        "
    );

    sqlx::query_as::<_, CommentRecord>(&query)
        .bind(post_id)
        .bind(author_id)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_comments",))
}

// ============================================================================
// Like Queries
// ============================================================================

/// Record a like. Returns `None` when the user already liked the post
/// (the unique constraint absorbs the duplicate).
pub async fn create_like(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
) -> sqlx::Result<Option<Like>> {
    sqlx::query_as::<_, Like>(
        r"
        INSERT INTO likes (post_id, author_id)
        VALUES ($1, $2)
        ON CONFLICT (post_id, author_id) DO NOTHING
        RETURNING *
        ",
    )
    .bind(post_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("create_like", post_id = %post_id, author_id = %author_id))
}

/// Remove a user's like from a post. Returns the number of rows
/// deleted (0 when no like existed).
pub async fn delete_like(pool: &PgPool, post_id: Uuid, author_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND author_id = $2")
        .bind(post_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_like", post_id = %post_id, author_id = %author_id))?;

    Ok(result.rows_affected())
}

/// List likes, newest first, optionally scoped to a post and/or an
/// author.
pub async fn list_likes(
    pool: &PgPool,
    post_id: Option<Uuid>,
    author_id: Option<Uuid>,
) -> sqlx::Result<Vec<LikeRecord>> {
    let query = format!(
        r"{LIKE_RECORD_SELECT}
        WHERE ($1::uuid IS NULL OR l.post_id = $1)
          AND ($2::uuid IS NULL OR l.author_id = $2)
        ORDER BY l.created_at DESC
        "
    );

    sqlx::query_as::<_, LikeRecord>(&query)
        .bind(post_id)
        .bind(author_id)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_likes",))
}

// ============================================================================
// Aggregates
// ============================================================================

/// Comment counts per post for a set of posts (bulk, avoids N+1).
pub async fn count_comments_for_posts(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> sqlx::Result<Vec<(Uuid, i64)>> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, (Uuid, i64)>(
        r"
        SELECT post_id, COUNT(*)
        FROM comments
        WHERE post_id = ANY($1)
        GROUP BY post_id
        ",
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await
    .map_err(db_error!("count_comments_for_posts",))
}

/// Like counts per post for a set of posts (bulk, avoids N+1).
pub async fn count_likes_for_posts(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> sqlx::Result<Vec<(Uuid, i64)>> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, (Uuid, i64)>(
        r"
        SELECT post_id, COUNT(*)
        FROM likes
        WHERE post_id = ANY($1)
        GROUP BY post_id
        ",
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await
    .map_err(db_error!("count_likes_for_posts",))
}
