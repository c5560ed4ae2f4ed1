use anyhow::Result;
use serde_json::json;
use tracing::warn;

use crate::app::media::{MediaService, UploadSource};
use crate::domain::user::UserDoc;
use crate::infra::cache::{QueryCache, QueryKey};
use crate::infra::documents::{Documents, ListQuery};

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub user_id: String,
    pub name: String,
    pub bio: Option<String>,
    pub image_url: String,
    pub image_id: Option<String>,
    pub file: Option<UploadSource>,
}

#[derive(Clone)]
pub struct UserService {
    documents: Documents,
    media: MediaService,
    cache: QueryCache,
    collection_id: String,
}

impl UserService {
    pub fn new(
        documents: Documents,
        media: MediaService,
        cache: QueryCache,
        collection_id: String,
    ) -> Self {
        Self {
            documents,
            media,
            cache,
            collection_id,
        }
    }

    /// Newest accounts first (the creators rail).
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<UserDoc>> {
        if let Some(users) = self.cache.get::<Vec<UserDoc>>(&QueryKey::Users) {
            return Ok(users);
        }
        let mut query = ListQuery::new().order_desc("created_at");
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let list = self
            .documents
            .list::<UserDoc>(&self.collection_id, query)
            .await?;
        self.cache.put(QueryKey::Users, &list.documents);
        Ok(list.documents)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserDoc>> {
        let key = QueryKey::UserById(user_id.to_string());
        if let Some(user) = self.cache.get::<UserDoc>(&key) {
            return Ok(Some(user));
        }
        let user = self
            .documents
            .get::<UserDoc>(&self.collection_id, user_id)
            .await?;
        if let Some(user) = &user {
            self.cache.put(key, user);
        }
        Ok(user)
    }

    /// Profile edit, with the same replace-image compensation scheme as
    /// posts: a failed document write deletes the fresh upload, a
    /// successful one deletes the image it replaced.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserDoc> {
        let replacement = match update.file.clone() {
            Some(file) => Some(self.media.upload_image(file).await?),
            None => None,
        };
        let (image_url, image_id) = match &replacement {
            Some(image) => (image.view_url.clone(), Some(image.file_id.clone())),
            None => (update.image_url.clone(), update.image_id.clone()),
        };

        let data = json!({
            "name": update.name,
            "bio": update.bio,
            "image_url": image_url,
            "image_id": image_id,
        });

        let updated = self
            .documents
            .update::<UserDoc>(&self.collection_id, &update.user_id, data)
            .await;

        match updated {
            Ok(updated) => {
                if replacement.is_some() {
                    if let Some(previous) = &update.image_id {
                        self.discard_upload(previous).await;
                    }
                }
                self.cache.invalidate(&QueryKey::CurrentUser);
                self.cache
                    .invalidate(&QueryKey::UserById(updated.id.clone()));
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

    async fn discard_upload(&self, file_id: &str) {
        if let Err(err) = self.media.delete_image(file_id).await {
            warn!(file_id, error = %err, "failed to delete stored file");
        }
    }
}
