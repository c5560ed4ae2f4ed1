use anyhow::{anyhow, Result};
use serde_json::json;
use uuid::Uuid;

use crate::domain::social_graph::FollowRecord;
use crate::infra::cache::{QueryCache, QueryKey};
use crate::infra::documents::{Documents, ListQuery};

#[derive(Clone)]
pub struct SocialService {
    documents: Documents,
    cache: QueryCache,
    collection_id: String,
}

impl SocialService {
    pub fn new(documents: Documents, cache: QueryCache, collection_id: String) -> Self {
        Self {
            documents,
            cache,
            collection_id,
        }
    }

    pub async fn follow(&self, follower_id: &str, following_id: &str) -> Result<FollowRecord> {
        if follower_id.is_empty() || following_id.is_empty() || follower_id == following_id {
            return Err(anyhow!("invalid follow pair"));
        }

        let record = self
            .documents
            .create::<FollowRecord>(
                &self.collection_id,
                &Uuid::new_v4().to_string(),
                json!({ "follower_id": follower_id, "following_id": following_id }),
            )
            .await?;

        self.invalidate_profiles(following_id);
        Ok(record)
    }

    /// Looks the record up by the (follower, following) pair; the backend
    /// has no delete-by-filter, so this is a list-then-delete.
    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> Result<()> {
        let follows = self
            .documents
            .list::<FollowRecord>(
                &self.collection_id,
                ListQuery::new()
                    .equal("follower_id", follower_id)
                    .equal("following_id", following_id),
            )
            .await?;

        let record = follows
            .documents
            .first()
            .ok_or_else(|| anyhow!("not following"))?;
        self.documents.delete(&self.collection_id, &record.id).await?;

        self.invalidate_profiles(following_id);
        Ok(())
    }

    fn invalidate_profiles(&self, following_id: &str) {
        self.cache
            .invalidate(&QueryKey::UserById(following_id.to_string()));
        self.cache.invalidate(&QueryKey::CurrentUser);
    }
}
