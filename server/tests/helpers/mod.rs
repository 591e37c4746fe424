//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full
//! axum router, plus utilities for user/post creation and JWT generation.
//!
//! ## Shared Resources
//!
//! Use [`shared_pool()`] to avoid creating new connections per test.
//!
//! ## Cleanup Guards
//!
//! Use [`CleanupGuard`] for RAII-based cleanup that runs even if a test panics.
#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use quill_server::access::PermissionTier;
use quill_server::api::{create_router, AppState};
use quill_server::auth::jwt;
use quill_server::config::Config;
use quill_server::db;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use uuid::Uuid;

// ============================================================================
// Shared resources
// ============================================================================

/// Shared database pool across all tests in the same binary.
static SHARED_POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Shared config across all tests in the same binary.
static SHARED_CONFIG: OnceCell<Config> = OnceCell::const_new();

/// Get or create a shared database pool.
///
/// Reuses a single pool across all test cases in the same binary,
/// avoiding connection exhaustion from creating pools per-test.
pub async fn shared_pool() -> &'static PgPool {
    SHARED_POOL
        .get_or_init(|| async {
            let config = shared_config().await;
            let pool = db::create_pool(&config.database_url)
                .await
                .expect("Failed to connect to test DB");
            db::run_migrations(&pool)
                .await
                .expect("Failed to run migrations on test DB");
            pool
        })
        .await
}

/// Get or create a shared config.
pub async fn shared_config() -> &'static Config {
    SHARED_CONFIG
        .get_or_init(|| async { Config::default_for_test() })
        .await
}

// ============================================================================
// Cleanup Guard
// ============================================================================

/// Async cleanup action type.
type CleanupAction = Box<dyn FnOnce(PgPool) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// RAII guard that runs cleanup actions on drop, even if the test panics.
pub struct CleanupGuard {
    pool: PgPool,
    actions: Vec<CleanupAction>,
}

impl CleanupGuard {
    /// Create a new cleanup guard for the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            actions: Vec::new(),
        }
    }

    /// Register a generic async cleanup action.
    pub fn add<F, Fut>(&mut self, action: F)
    where
        F: FnOnce(PgPool) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.actions
            .push(Box::new(move |pool| Box::pin(action(pool))));
    }

    /// Register cleanup to delete a user by ID (posts, comments, and
    /// likes cascade).
    pub fn delete_user(&mut self, user_id: Uuid) {
        self.add(move |pool| async move {
            let _ = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&pool)
                .await;
        });
    }

    /// Register cleanup to delete a post by ID.
    pub fn delete_post(&mut self, post_id: Uuid) {
        self.add(move |pool| async move {
            let _ = sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(post_id)
                .execute(&pool)
                .await;
        });
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let actions = std::mem::take(&mut self.actions);
        if actions.is_empty() {
            return;
        }

        let pool = self.pool.clone();
        let handle = tokio::runtime::Handle::current();

        // Spawn a blocking thread to run async cleanup.
        // This works regardless of tokio runtime flavor.
        std::thread::spawn(move || {
            handle.block_on(async move {
                for action in actions {
                    action(pool.clone()).await;
                }
            });
        })
        .join()
        .expect("Cleanup thread panicked");
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app using the shared DB connection.
    pub async fn new() -> Self {
        let pool = shared_pool().await.clone();
        let config = shared_config().await.clone();

        let state = AppState::new(pool.clone(), config.clone());
        let router = create_router(state);

        Self {
            router,
            pool,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Create a [`CleanupGuard`] for this app's pool.
    pub fn cleanup_guard(&self) -> CleanupGuard {
        CleanupGuard::new(self.pool.clone())
    }
}

// ============================================================================
// User & Auth helpers
// ============================================================================

/// Create a test user on the given team and return `(user_id, username)`.
///
/// Inserts directly so the user never becomes the first-registered
/// superuser by accident.
pub async fn create_test_user(pool: &PgPool, team: &str) -> (Uuid, String) {
    let test_id = Uuid::new_v4().to_string()[..8].to_string();
    let username = format!("httptest_{test_id}");

    let row: (Uuid,) = sqlx::query_as(
        r"
        INSERT INTO users (username, display_name, password_hash, team)
        VALUES ($1, $2, 'test_hash_only', $3)
        RETURNING id
        ",
    )
    .bind(&username)
    .bind("HTTP Test User")
    .bind(team)
    .fetch_one(pool)
    .await
    .expect("Failed to create test user");

    (row.0, username)
}

/// Create a superuser test account and return its ID.
pub async fn create_test_superuser(pool: &PgPool) -> Uuid {
    let (user_id, _) = create_test_user(pool, "ops").await;
    sqlx::query("UPDATE users SET is_superuser = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to grant superuser");
    user_id
}

/// Generate an access token for the given user.
pub fn generate_access_token(config: &Config, user_id: Uuid) -> String {
    let pair = jwt::generate_token_pair(
        user_id,
        &config.jwt_private_key,
        config.jwt_access_expiry,
        config.jwt_refresh_expiry,
    )
    .expect("Failed to generate token pair");
    pair.access_token
}

/// Delete a user by ID (cascades to posts, comments, likes, sessions).
pub async fn delete_user(pool: &PgPool, user_id: Uuid) {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to delete test user");
}

// ============================================================================
// Data helpers (posts, comments, likes)
// ============================================================================

/// Insert a post with explicit visibility settings and return its ID.
pub async fn insert_post(
    pool: &PgPool,
    author_id: Uuid,
    team: &str,
    is_public: bool,
    authenticated: PermissionTier,
    group: PermissionTier,
) -> Uuid {
    let post_id = Uuid::now_v7();
    let title = format!("Test post {}", &post_id.to_string()[..8]);

    sqlx::query(
        r"
        INSERT INTO posts (id, author_id, team, title, content, is_public,
                           authenticated_permission, group_permission)
        VALUES ($1, $2, $3, $4, 'Test content for the post body.', $5, $6, $7)
        ",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(team)
    .bind(&title)
    .bind(is_public)
    .bind(authenticated)
    .bind(group)
    .execute(pool)
    .await
    .expect("Failed to insert post");

    post_id
}

/// Insert a comment and return its ID.
pub async fn insert_comment(pool: &PgPool, post_id: Uuid, author_id: Uuid, content: &str) -> Uuid {
    let comment_id = Uuid::now_v7();

    sqlx::query("INSERT INTO comments (id, post_id, author_id, content) VALUES ($1, $2, $3, $4)")
        .bind(comment_id)
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .execute(pool)
        .await
        .expect("Failed to insert comment");

    comment_id
}

/// Insert a like and return its ID.
pub async fn insert_like(pool: &PgPool, post_id: Uuid, author_id: Uuid) -> Uuid {
    let like_id = Uuid::now_v7();

    sqlx::query("INSERT INTO likes (id, post_id, author_id) VALUES ($1, $2, $3)")
        .bind(like_id)
        .bind(post_id)
        .bind(author_id)
        .execute(pool)
        .await
        .expect("Failed to insert like");

    like_id
}

/// Delete a post by ID (cascades comments and likes).
pub async fn delete_post(pool: &PgPool, post_id: Uuid) {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await
        .ok();
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
