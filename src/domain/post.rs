use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub creator_id: String,
    pub caption: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: String,
    pub image_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Ordered liker ids. The tracker enforces uniqueness; the backend
    /// stores whatever full list the last writer sent.
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Post {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }
}

/// One fetched block of the infinite feed. Immutable after construction;
/// the cursor is the id of the trailing post.
#[derive(Debug, Clone)]
pub struct Page {
    posts: Vec<Post>,
    cursor: String,
}

impl Page {
    /// Returns `None` for an empty block: an empty page is the pager's
    /// terminal signal, never part of the page list.
    pub fn from_posts(posts: Vec<Post>) -> Option<Self> {
        let cursor = posts.last()?.id.clone();
        Some(Self { posts, cursor })
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
