use serde_json::json;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::domain::user::CurrentUser;
use crate::infra::cache::{QueryCache, QueryKey};
use crate::infra::documents::Documents;

/// Optimistic like/save state for one displayed post.
///
/// Both toggles flip local state before the backend write settles. A
/// failed write is logged and left in its optimistic position; there is
/// no rollback, the next full refetch reconciles. The like list is
/// written back whole (the backend has no atomic set add/remove), so
/// concurrent toggles from different sessions race last-writer-wins.
pub struct InteractionTracker {
    documents: Documents,
    cache: QueryCache,
    post_collection_id: String,
    saves_collection_id: String,
    post_id: String,
    state: Mutex<InteractionState>,
}

#[derive(Debug, Clone)]
struct InteractionState {
    likes: Vec<String>,
    save_record_id: Option<String>,
    saved: bool,
}

impl InteractionTracker {
    /// Seeds from a loaded post and, when signed in, the viewer's save
    /// records. Duplicate liker ids are dropped here, first occurrence
    /// wins; the backend stores whatever it was last sent.
    pub fn new(
        documents: Documents,
        cache: QueryCache,
        post_collection_id: String,
        saves_collection_id: String,
        post: &Post,
        viewer: Option<&CurrentUser>,
    ) -> Self {
        let mut likes = Vec::with_capacity(post.likes.len());
        for id in &post.likes {
            if !likes.contains(id) {
                likes.push(id.clone());
            }
        }
        let save_record_id = viewer
            .and_then(|viewer| viewer.save_record_for(&post.id))
            .map(|record| record.id.clone());

        Self {
            documents,
            cache,
            post_collection_id,
            saves_collection_id,
            post_id: post.id.clone(),
            state: Mutex::new(InteractionState {
                likes,
                saved: save_record_id.is_some(),
                save_record_id,
            }),
        }
    }

    pub fn likes(&self) -> Vec<String> {
        self.lock().likes.clone()
    }

    pub fn like_count(&self) -> usize {
        self.lock().likes.len()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.lock().likes.iter().any(|id| id == user_id)
    }

    pub fn is_saved(&self) -> bool {
        self.lock().saved
    }

    /// Removes the viewer from the like list if present, else appends;
    /// the order of the remaining entries is preserved. The new list is
    /// applied locally first, then written back whole. Returns the
    /// optimistic list.
    pub async fn toggle_like(&self, viewer_id: &str) -> Vec<String> {
        let likes = {
            let mut state = self.lock();
            if state.likes.iter().any(|id| id == viewer_id) {
                state.likes.retain(|id| id != viewer_id);
            } else {
                state.likes.push(viewer_id.to_string());
            }
            state.likes.clone()
        };

        let write = self
            .documents
            .update::<Post>(
                &self.post_collection_id,
                &self.post_id,
                json!({ "likes": likes }),
            )
            .await;

        match write {
            Ok(_) => {
                self.cache
                    .invalidate(&QueryKey::PostById(self.post_id.clone()));
                self.invalidate_post_lists();
            }
            Err(err) => {
                warn!(post_id = %self.post_id, error = %err, "like write failed; local state kept");
            }
        }

        likes
    }

    /// Strict toggle: deletes the existing save record, or creates one
    /// (client-generated id) when none exists. Returns the optimistic
    /// saved flag.
    pub async fn toggle_save(&self, viewer_id: &str) -> bool {
        let (to_delete, to_create) = {
            let mut state = self.lock();
            match state.save_record_id.take() {
                Some(record_id) => {
                    state.saved = false;
                    (Some(record_id), None)
                }
                None => {
                    let record_id = Uuid::new_v4().to_string();
                    state.saved = true;
                    state.save_record_id = Some(record_id.clone());
                    (None, Some(record_id))
                }
            }
        };

        if let Some(record_id) = to_delete {
            if let Err(err) = self
                .documents
                .delete(&self.saves_collection_id, &record_id)
                .await
            {
                warn!(post_id = %self.post_id, error = %err, "unsave write failed; local state kept");
            } else {
                self.invalidate_post_lists();
            }
        } else if let Some(record_id) = to_create {
            let created = self
                .documents
                .create::<serde_json::Value>(
                    &self.saves_collection_id,
                    &record_id,
                    json!({ "user_id": viewer_id, "post_id": self.post_id }),
                )
                .await;
            match created {
                Ok(_) => self.invalidate_post_lists(),
                Err(err) => {
                    warn!(post_id = %self.post_id, error = %err, "save write failed; local state kept");
                }
            }
        }

        self.lock().saved
    }

    fn lock(&self) -> MutexGuard<'_, InteractionState> {
        self.state.lock().expect("interaction state poisoned")
    }

    fn invalidate_post_lists(&self) {
        self.cache.invalidate(&QueryKey::RecentPosts);
        self.cache.invalidate(&QueryKey::InfinitePosts);
        self.cache.invalidate(&QueryKey::CurrentUser);
    }
}
