use anyhow::{anyhow, Result};
use std::str::FromStr;
use url::Url;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub user_collection_id: String,
    pub post_collection_id: String,
    pub saves_collection_id: String,
    pub follows_collection_id: String,
    pub storage_bucket_id: String,
    pub feed_page_size: i64,
    pub recent_posts_limit: i64,
    pub search_debounce_ms: u64,
    pub http_timeout_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let endpoint = env_or_err("BACKEND_ENDPOINT")?;
        Url::parse(&endpoint).map_err(|err| anyhow!("invalid BACKEND_ENDPOINT: {}", err))?;

        Ok(Self {
            endpoint,
            project_id: env_or_err("BACKEND_PROJECT_ID")?,
            database_id: env_or_err("BACKEND_DATABASE_ID")?,
            user_collection_id: env_or_err("USER_COLLECTION_ID")?,
            post_collection_id: env_or_err("POST_COLLECTION_ID")?,
            saves_collection_id: env_or_err("SAVES_COLLECTION_ID")?,
            follows_collection_id: env_or_err("FOLLOWS_COLLECTION_ID")?,
            storage_bucket_id: env_or_err("STORAGE_BUCKET_ID")?,
            feed_page_size: env_or_parse("FEED_PAGE_SIZE", "9")?,
            recent_posts_limit: env_or_parse("RECENT_POSTS_LIMIT", "20")?,
            search_debounce_ms: env_or_parse("SEARCH_DEBOUNCE_MS", "150")?,
            http_timeout_seconds: env_or_parse("HTTP_TIMEOUT_SECONDS", "30")?,
        })
    }
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
