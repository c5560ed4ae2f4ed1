#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::MockServer;

use lueur::config::AppConfig;
use lueur::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DB: &str = "db_main";
pub const POSTS: &str = "col_posts";
pub const USERS: &str = "col_users";
pub const SAVES: &str = "col_saves";
pub const FOLLOWS: &str = "col_follows";
pub const BUCKET: &str = "bkt_media";

// Short debounce so search tests stay fast; keystroke gaps in tests are
// well inside it.
pub const TEST_DEBOUNCE_MS: u64 = 40;

// ---------------------------------------------------------------------------
// TestApp — one mock backend per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub server: MockServer,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let config = AppConfig {
            endpoint: server.uri(),
            project_id: "proj_test".into(),
            database_id: DB.into(),
            user_collection_id: USERS.into(),
            post_collection_id: POSTS.into(),
            saves_collection_id: SAVES.into(),
            follows_collection_id: FOLLOWS.into(),
            storage_bucket_id: BUCKET.into(),
            feed_page_size: 9,
            recent_posts_limit: 20,
            search_debounce_ms: TEST_DEBOUNCE_MS,
            http_timeout_seconds: 5,
        };
        let state = AppState::new(config).expect("failed to build app state");
        Self { server, state }
    }

    /// Requests received so far for an exact URL path.
    pub async fn requests_to(&self, path: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .expect("request recording is enabled")
            .into_iter()
            .filter(|request| request.url.path() == path)
            .collect()
    }

    pub async fn request_count(&self, path: &str) -> usize {
        self.requests_to(path).await.len()
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

pub fn documents_path(collection: &str) -> String {
    format!("/v1/databases/{}/collections/{}/documents", DB, collection)
}

pub fn document_path(collection: &str, id: &str) -> String {
    format!("{}/{}", documents_path(collection), id)
}

pub fn files_path() -> String {
    format!("/v1/storage/buckets/{}/files", BUCKET)
}

pub fn file_path(file_id: &str) -> String {
    format!("{}/{}", files_path(), file_id)
}

// ---------------------------------------------------------------------------
// Document builders
// ---------------------------------------------------------------------------

pub fn post_json(id: &str, creator_id: &str, caption: &str, likes: &[&str]) -> Value {
    json!({
        "id": id,
        "creator_id": creator_id,
        "caption": caption,
        "tags": ["travel"],
        "image_url": format!("https://cdn.test/{}.jpg", id),
        "image_id": format!("file_{}", id),
        "location": "Lyon",
        "likes": likes,
        "created_at": "2025-06-01T12:00:00Z",
        "updated_at": "2025-06-02T12:00:00Z",
    })
}

pub fn user_json(id: &str, account_id: &str, name: &str, username: &str) -> Value {
    json!({
        "id": id,
        "account_id": account_id,
        "name": name,
        "username": username,
        "email": format!("{}@example.test", username),
        "image_url": format!("https://cdn.test/avatars/{}.png", id),
        "image_id": null,
        "bio": null,
        "created_at": "2025-05-01T08:00:00Z",
        "updated_at": "2025-05-01T08:00:00Z",
    })
}

pub fn save_json(id: &str, user_id: &str, post_id: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "post_id": post_id,
        "created_at": "2025-06-03T09:00:00Z",
    })
}

pub fn follow_json(id: &str, follower_id: &str, following_id: &str) -> Value {
    json!({
        "id": id,
        "follower_id": follower_id,
        "following_id": following_id,
        "created_at": "2025-06-03T09:00:00Z",
    })
}

pub fn account_json(id: &str, name: &str, email: &str) -> Value {
    json!({ "id": id, "email": email, "name": name })
}

pub fn doc_list(documents: Vec<Value>) -> Value {
    json!({ "total": documents.len(), "documents": documents })
}

/// A run of post documents `p{start}..=p{end}`, newest first like the
/// backend returns them.
pub fn post_run(start: usize, end: usize) -> Vec<Value> {
    (start..=end)
        .map(|n| post_json(&format!("p{}", n), "creator_1", &format!("caption {}", n), &[]))
        .collect()
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
