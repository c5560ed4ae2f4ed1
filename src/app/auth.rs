use anyhow::{anyhow, Result};
use serde_json::json;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::engagement::SaveRecord;
use crate::domain::user::{CurrentUser, UserDoc};
use crate::infra::account::{AccountApi, SessionToken};
use crate::infra::cache::{QueryCache, QueryKey};
use crate::infra::documents::{Documents, ListQuery};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    account: AccountApi,
    documents: Documents,
    cache: QueryCache,
    user_collection_id: String,
    saves_collection_id: String,
}

impl AuthService {
    pub fn new(
        account: AccountApi,
        documents: Documents,
        cache: QueryCache,
        user_collection_id: String,
        saves_collection_id: String,
    ) -> Self {
        Self {
            account,
            documents,
            cache,
            user_collection_id,
            saves_collection_id,
        }
    }

    /// Registers a backend account and persists the matching profile
    /// document, seeded with an initials avatar. Does not sign in; the
    /// caller follows up with `sign_in`.
    pub async fn sign_up(&self, new_user: NewUser) -> Result<UserDoc> {
        let account = self
            .account
            .create(
                &Uuid::new_v4().to_string(),
                &new_user.email,
                &new_user.password,
                &new_user.name,
            )
            .await?;

        let avatar_url = self.account.initials_avatar_url(&account.name);
        let user = self
            .documents
            .create::<UserDoc>(
                &self.user_collection_id,
                &Uuid::new_v4().to_string(),
                json!({
                    "account_id": account.id,
                    "name": account.name,
                    "email": account.email,
                    "username": new_user.username,
                    "image_url": avatar_url,
                }),
            )
            .await?;

        Ok(user)
    }

    /// Drops whatever session is active (best effort), then opens a fresh
    /// email session. The session secret lands on the shared connection.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionToken> {
        if let Err(err) = self.account.delete_current_session().await {
            debug!(error = %err, "no session to replace");
        }
        Ok(self.account.create_email_session(email, password).await?)
    }

    /// Ends the session and resets every cached read; nothing fetched
    /// under the old session may survive it, even when the backend call
    /// fails.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.account.delete_current_session().await;
        self.cache.clear();
        result?;
        Ok(())
    }

    pub fn restore_session(&self, secret: String) {
        self.account.restore_session(secret);
    }

    /// Resolves the viewer: account, then profile document, then the
    /// viewer's save records. `None` when no session is active.
    pub async fn current_user(&self) -> Result<Option<CurrentUser>> {
        if let Some(current) = self.cache.get::<CurrentUser>(&QueryKey::CurrentUser) {
            return Ok(Some(current));
        }

        let account = match self.account.get().await? {
            Some(account) => account,
            None => return Ok(None),
        };

        let users = self
            .documents
            .list::<UserDoc>(
                &self.user_collection_id,
                ListQuery::new().equal("account_id", &account.id),
            )
            .await?;
        let user = users
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no profile document for account {}", account.id))?;

        let saves = self
            .documents
            .list::<SaveRecord>(
                &self.saves_collection_id,
                ListQuery::new().equal("user_id", &user.id),
            )
            .await?;

        let current = CurrentUser {
            user,
            saves: saves.documents,
        };
        self.cache.put(QueryKey::CurrentUser, &current);
        Ok(Some(current))
    }
}

/// Explicit session state threaded through component boundaries instead
/// of living at process scope. `restore` is the on-load check for a
/// persisted session; `sign_out` tears down to anonymous defaults.
pub struct SessionContext {
    auth: AuthService,
    viewer: Mutex<Option<CurrentUser>>,
}

impl SessionContext {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            viewer: Mutex::new(None),
        }
    }

    /// Installs a persisted session secret (if any) and resolves the
    /// viewer. Returns whether a session was restored.
    pub async fn restore(&self, persisted_secret: Option<String>) -> Result<bool> {
        match persisted_secret {
            Some(secret) => self.auth.restore_session(secret),
            None => return Ok(false),
        }
        self.refresh().await
    }

    /// Re-resolves the viewer from the backend (e.g. after sign-in or a
    /// current-user invalidation).
    pub async fn refresh(&self) -> Result<bool> {
        let current = self.auth.current_user().await?;
        let authenticated = current.is_some();
        *self.viewer.lock().expect("session state poisoned") = current;
        Ok(authenticated)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<bool> {
        self.auth.sign_in(email, password).await?;
        self.refresh().await
    }

    pub async fn sign_out(&self) {
        if let Err(err) = self.auth.sign_out().await {
            warn!(error = %err, "sign-out did not complete cleanly");
        }
        *self.viewer.lock().expect("session state poisoned") = None;
    }

    pub fn viewer(&self) -> Option<CurrentUser> {
        self.viewer.lock().expect("session state poisoned").clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.viewer.lock().expect("session state poisoned").is_some()
    }
}
