use anyhow::Result;
use futures::future::join_all;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::app::media::{MediaService, UploadSource};
use crate::domain::post::Post;
use crate::infra::cache::{QueryCache, QueryKey};
use crate::infra::documents::{DocumentList, Documents, ListQuery};

/// Form input for a new post. Tags arrive as the comma-separated string
/// the user typed; parsing happens here.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub creator_id: String,
    pub caption: String,
    pub tags: String,
    pub location: Option<String>,
    pub file: UploadSource,
}

#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub post_id: String,
    pub caption: String,
    pub tags: String,
    pub location: Option<String>,
    pub image_url: String,
    pub image_id: String,
    /// Replacement image, when the user picked a new one.
    pub file: Option<UploadSource>,
}

#[derive(Clone)]
pub struct PostService {
    documents: Documents,
    media: MediaService,
    cache: QueryCache,
    collection_id: String,
    recent_limit: i64,
}

impl PostService {
    pub fn new(
        documents: Documents,
        media: MediaService,
        cache: QueryCache,
        collection_id: String,
        recent_limit: i64,
    ) -> Self {
        Self {
            documents,
            media,
            cache,
            collection_id,
            recent_limit,
        }
    }

    /// Upload-then-create. A document failure after a successful upload
    /// deletes the orphaned file before surfacing the error.
    pub async fn create_post(&self, post: NewPost) -> Result<Post> {
        let image = self.media.upload_image(post.file.clone()).await?;

        let data = json!({
            "creator_id": post.creator_id,
            "caption": post.caption,
            "tags": parse_tags(&post.tags),
            "image_url": image.view_url,
            "image_id": image.file_id,
            "location": post.location,
            "likes": [],
        });

        let created = self
            .documents
            .create::<Post>(&self.collection_id, &Uuid::new_v4().to_string(), data)
            .await;

        match created {
            Ok(created) => {
                self.cache.invalidate(&QueryKey::RecentPosts);
                Ok(created)
            }
            Err(err) => {
                self.discard_upload(&image.file_id).await;
                Err(err.into())
            }
        }
    }

    pub async fn update_post(&self, update: PostUpdate) -> Result<Post> {
        let replacement = match update.file.clone() {
            Some(file) => Some(self.media.upload_image(file).await?),
            None => None,
        };
        let (image_url, image_id) = match &replacement {
            Some(image) => (image.view_url.clone(), image.file_id.clone()),
            None => (update.image_url.clone(), update.image_id.clone()),
        };

        let data = json!({
            "caption": update.caption,
            "tags": parse_tags(&update.tags),
            "image_url": image_url,
            "image_id": image_id,
            "location": update.location,
        });

        let updated = self
            .documents
            .update::<Post>(&self.collection_id, &update.post_id, data)
            .await;

        match updated {
            Ok(updated) => {
                if replacement.is_some() {
                    self.discard_upload(&update.image_id).await;
                }
                self.cache
                    .invalidate(&QueryKey::PostById(updated.id.clone()));
                Ok(updated)
            }
            Err(err) => {
                if let Some(image) = replacement {
                    self.discard_upload(&image.file_id).await;
                }
                Err(err.into())
            }
        }
    }

    pub async fn delete_post(&self, post_id: &str, image_id: &str) -> Result<()> {
        self.documents.delete(&self.collection_id, post_id).await?;
        self.discard_upload(image_id).await;
        self.cache.invalidate(&QueryKey::RecentPosts);
        self.cache.invalidate(&QueryKey::PostById(post_id.to_string()));
        Ok(())
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let key = QueryKey::PostById(post_id.to_string());
        if let Some(post) = self.cache.get::<Post>(&key) {
            return Ok(Some(post));
        }
        let post = self.documents.get::<Post>(&self.collection_id, post_id).await?;
        if let Some(post) = &post {
            self.cache.put(key, post);
        }
        Ok(post)
    }

    /// Home feed: newest posts first, bounded, cached until invalidated.
    pub async fn recent_posts(&self) -> Result<Vec<Post>> {
        if let Some(posts) = self.cache.get::<Vec<Post>>(&QueryKey::RecentPosts) {
            return Ok(posts);
        }
        let list = self
            .documents
            .list::<Post>(
                &self.collection_id,
                ListQuery::new().order_desc("created_at").limit(self.recent_limit),
            )
            .await?;
        self.cache.put(QueryKey::RecentPosts, &list.documents);
        Ok(list.documents)
    }

    pub async fn user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        let key = QueryKey::UserPosts(user_id.to_string());
        if let Some(posts) = self.cache.get::<Vec<Post>>(&key) {
            return Ok(posts);
        }
        let list = self
            .documents
            .list::<Post>(
                &self.collection_id,
                ListQuery::new()
                    .equal("creator_id", user_id)
                    .order_desc("created_at"),
            )
            .await?;
        self.cache.put(key, &list.documents);
        Ok(list.documents)
    }

    /// Resolves a set of posts by id in parallel (saved-posts screen).
    /// Posts deleted since the save records were fetched are skipped.
    pub async fn posts_by_ids(&self, post_ids: &[String]) -> Result<Vec<Post>> {
        let lookups = post_ids.iter().map(|id| self.get_post(id));
        let mut posts = Vec::with_capacity(post_ids.len());
        for resolved in join_all(lookups).await {
            if let Some(post) = resolved? {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    /// One block of the infinite feed, ordered by last update descending.
    pub async fn feed_page(
        &self,
        cursor_after: Option<&str>,
        limit: i64,
    ) -> Result<DocumentList<Post>> {
        let mut query = ListQuery::new().order_desc("updated_at").limit(limit);
        if let Some(cursor) = cursor_after {
            query = query.cursor_after(cursor);
        }
        Ok(self.documents.list::<Post>(&self.collection_id, query).await?)
    }

    pub async fn search_posts(&self, term: &str) -> Result<Vec<Post>> {
        let list = self
            .documents
            .search::<Post>(&self.collection_id, "caption", term)
            .await?;
        Ok(list.documents)
    }

    async fn discard_upload(&self, file_id: &str) {
        if let Err(err) = self.media.delete_image(file_id).await {
            warn!(file_id, error = %err, "failed to delete stored file");
        }
    }
}

fn parse_tags(tags: &str) -> Vec<String> {
    tags.replace(' ', "")
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
