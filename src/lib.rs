pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

use anyhow::Result;

use crate::app::auth::{AuthService, SessionContext};
use crate::app::engagement::InteractionTracker;
use crate::app::feed::{ExploreFeed, FeedPager};
use crate::app::media::MediaService;
use crate::app::posts::PostService;
use crate::app::search::SearchController;
use crate::app::social::SocialService;
use crate::app::users::UserService;
use crate::config::AppConfig;
use crate::domain::post::Post;
use crate::domain::user::CurrentUser;
use crate::infra::{
    account::AccountApi, cache::QueryCache, documents::Documents, http::Connection,
    storage::FileStorage,
};

/// Shared backend handles every component is built from. Cheap to clone;
/// all clones share one session slot and one query cache.
#[derive(Clone)]
pub struct AppState {
    pub documents: Documents,
    pub storage: FileStorage,
    pub account: AccountApi,
    pub cache: QueryCache,
    pub config: AppConfig,
}

impl AppState {
    pub fn from_env() -> Result<Self> {
        Self::new(AppConfig::from_env()?)
    }

    pub fn new(config: AppConfig) -> Result<Self> {
        let conn = Connection::new(&config)?;
        Ok(Self {
            documents: Documents::new(conn.clone(), config.database_id.clone()),
            storage: FileStorage::new(conn.clone(), config.storage_bucket_id.clone()),
            account: AccountApi::new(conn),
            cache: QueryCache::new(),
            config,
        })
    }

    pub fn media_service(&self) -> MediaService {
        MediaService::new(self.storage.clone())
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(
            self.documents.clone(),
            self.media_service(),
            self.cache.clone(),
            self.config.post_collection_id.clone(),
            self.config.recent_posts_limit,
        )
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(
            self.documents.clone(),
            self.media_service(),
            self.cache.clone(),
            self.config.user_collection_id.clone(),
        )
    }

    pub fn social_service(&self) -> SocialService {
        SocialService::new(
            self.documents.clone(),
            self.cache.clone(),
            self.config.follows_collection_id.clone(),
        )
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.account.clone(),
            self.documents.clone(),
            self.cache.clone(),
            self.config.user_collection_id.clone(),
            self.config.saves_collection_id.clone(),
        )
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(self.auth_service())
    }

    pub fn feed_pager(&self) -> FeedPager {
        FeedPager::new(
            self.post_service(),
            self.cache.clone(),
            self.config.feed_page_size,
        )
    }

    pub fn search_controller(&self) -> SearchController {
        SearchController::new(
            self.documents.clone(),
            self.cache.clone(),
            self.config.post_collection_id.clone(),
            self.config.search_debounce_ms,
        )
    }

    pub fn explore_feed(&self) -> ExploreFeed {
        ExploreFeed::new(self.feed_pager(), self.search_controller())
    }

    pub fn interaction_tracker(
        &self,
        post: &Post,
        viewer: Option<&CurrentUser>,
    ) -> InteractionTracker {
        InteractionTracker::new(
            self.documents.clone(),
            self.cache.clone(),
            self.config.post_collection_id.clone(),
            self.config.saves_collection_id.clone(),
            post,
            viewer,
        )
    }
}
