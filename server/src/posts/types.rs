//! Types for posts, comments, and likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::access::{AccessLevel, PermissionTier, Visibility};

/// Default page size for post listings.
pub const POSTS_PAGE_SIZE: i64 = 10;
/// Default page size for comment listings.
pub const COMMENTS_PAGE_SIZE: i64 = 10;
/// Default page size for like listings.
pub const LIKES_PAGE_SIZE: i64 = 20;
/// Upper bound for client-requested page sizes.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Number of characters kept in a post list excerpt.
const EXCERPT_LENGTH: usize = 200;

/// Post model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub team: String,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub authenticated_permission: PermissionTier,
    pub group_permission: PermissionTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Visibility snapshot for the access evaluator.
    #[must_use]
    pub fn visibility(&self) -> Visibility<'_> {
        Visibility {
            author_id: self.author_id,
            team: &self.team,
            is_public: self.is_public,
            authenticated: self.authenticated_permission,
            group: self.group_permission,
        }
    }
}

/// Comment model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Like model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's username and the parent post's
/// visibility fields, so listings can be filtered per requester.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Parent post fields for access evaluation
    pub post_author_id: Uuid,
    pub post_team: String,
    pub is_public: bool,
    pub authenticated_permission: PermissionTier,
    pub group_permission: PermissionTier,
}

impl CommentRecord {
    /// Parent post's visibility snapshot.
    #[must_use]
    pub fn post_visibility(&self) -> Visibility<'_> {
        Visibility {
            author_id: self.post_author_id,
            team: &self.post_team,
            is_public: self.is_public,
            authenticated: self.authenticated_permission,
            group: self.group_permission,
        }
    }
}

/// Like joined with its author's username and the parent post's
/// visibility fields.
#[derive(Debug, Clone, FromRow)]
pub struct LikeRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    // Parent post fields for access evaluation
    pub post_author_id: Uuid,
    pub post_team: String,
    pub is_public: bool,
    pub authenticated_permission: PermissionTier,
    pub group_permission: PermissionTier,
}

impl LikeRecord {
    /// Parent post's visibility snapshot.
    #[must_use]
    pub fn post_visibility(&self) -> Visibility<'_> {
        Visibility {
            author_id: self.post_author_id,
            team: &self.post_team,
            is_public: self.is_public,
            authenticated: self.authenticated_permission,
            group: self.group_permission,
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    /// Post title.
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    /// Post body.
    #[validate(length(min = 1))]
    pub content: String,
    /// Whether anonymous readers may see the post (default: true).
    pub is_public: Option<bool>,
    /// Tier for authenticated users (default: read_only).
    pub authenticated_permission: Option<PermissionTier>,
    /// Tier for the author's team (default: read_only).
    pub group_permission: Option<PermissionTier>,
}

/// Request body for updating a post. Absent fields keep their value;
/// author and team are immutable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub is_public: Option<bool>,
    pub authenticated_permission: Option<PermissionTier>,
    pub group_permission: Option<PermissionTier>,
}

/// Request body for creating or updating a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentBodyRequest {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number (default: 1).
    pub page: Option<i64>,
    /// Items per page (default per resource, max 100).
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// Requested page, defaulting to the first.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    /// Requested page size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn page_size(&self, default: i64) -> i64 {
        self.page_size.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Post representation in listings: excerpt plus engagement counts.
#[derive(Debug, Serialize)]
pub struct PostListItem {
    pub id: Uuid,
    pub author: String,
    pub title: String,
    pub excerpt: String,
    pub likes: i64,
    pub comments: i64,
    pub team: String,
    pub is_public: bool,
    pub authenticated_permission: PermissionTier,
    pub group_permission: PermissionTier,
    /// The requester's ranked access level for this post.
    pub permission_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full post representation with embedded comments and likes.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub id: Uuid,
    pub author: String,
    pub title: String,
    pub content: String,
    pub team: String,
    pub is_public: bool,
    pub authenticated_permission: PermissionTier,
    pub group_permission: PermissionTier,
    /// The requester's ranked access level for this post.
    pub permission_level: AccessLevel,
    pub comments: Vec<CommentResponse>,
    pub likes: Vec<LikeResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment representation for clients.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRecord> for CommentResponse {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            post: record.post_id,
            author_name: record.author_name,
            content: record.content,
            created_at: record.created_at,
        }
    }
}

/// Like representation for clients.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub id: Uuid,
    pub post: Uuid,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<LikeRecord> for LikeResponse {
    fn from(record: LikeRecord) -> Self {
        Self {
            id: record.id,
            post: record.post_id,
            author_name: record.author_name,
            created_at: record.created_at,
        }
    }
}

/// Page-number pagination envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    /// Next page number, if any.
    pub next: Option<i64>,
    /// Previous page number, if any.
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

/// Slice `items` into a page-number envelope.
///
/// Returns `None` when the page is out of range (page < 1, or past the
/// end of a non-empty result set). An empty result set has exactly one
/// valid, empty page.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: i64, page_size: i64) -> Option<Paginated<T>> {
    if page < 1 {
        return None;
    }

    let total_count = items.len() as i64;
    let total_pages = ((total_count + page_size - 1) / page_size).max(1);

    if page > total_pages {
        return None;
    }

    let offset = ((page - 1) * page_size) as usize;
    let results: Vec<T> = items
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect();

    Some(Paginated {
        current_page: page,
        total_pages,
        total_count,
        next: (page < total_pages).then_some(page + 1),
        previous: (page > 1).then_some(page - 1),
        results,
    })
}

/// Truncate post content to a listing excerpt.
///
/// Counts characters, not bytes, so multibyte content never splits.
#[must_use]
pub fn excerpt(content: &str) -> String {
    if content.chars().count() <= EXCERPT_LENGTH {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(EXCERPT_LENGTH).collect();
        format!("{truncated}...")
    }
}
