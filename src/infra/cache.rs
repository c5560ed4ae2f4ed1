use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Identity of a cached read. Mutations invalidate the keys whose data
/// they may have changed; the next read misses and refetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    RecentPosts,
    InfinitePosts,
    PostById(String),
    UserPosts(String),
    SearchPosts(String),
    CurrentUser,
    Users,
    UserById(String),
}

/// Client-local cache of backend reads, keyed by query identity. Values
/// are stored as JSON so heterogeneous result types share one store.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, Value>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Value>> {
        self.entries.lock().expect("cache lock poisoned")
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.entries().get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(decoded) => {
                debug!(?key, "cache hit");
                Some(decoded)
            }
            Err(err) => {
                warn!(?key, error = %err, "dropping undecodable cache entry");
                self.entries().remove(key);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(encoded) => {
                self.entries().insert(key, encoded);
            }
            Err(err) => warn!(?key, error = %err, "failed to write cache entry"),
        }
    }

    pub fn invalidate(&self, key: &QueryKey) {
        if self.entries().remove(key).is_some() {
            debug!(?key, "invalidated");
        }
    }

    /// Drops everything. Used on sign-out, where no cached read may
    /// outlive the session it was fetched under.
    pub fn clear(&self) {
        self.entries().clear();
    }
}
