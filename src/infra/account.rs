use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::domain::user::Account;
use crate::infra::http::{BackendError, Connection};

/// Client for the backend's account/session service. Session lifecycle is
/// delegated entirely to the backend; this wrapper only moves the session
/// secret in and out of the shared `Connection`.
#[derive(Clone)]
pub struct AccountApi {
    conn: Connection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionToken {
    pub session_id: String,
    pub secret: String,
}

impl AccountApi {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, BackendError> {
        let builder = self.conn.request(Method::POST, "/v1/account").json(&json!({
            "user_id": user_id,
            "email": email,
            "password": password,
            "name": name,
        }));
        self.conn.recv_json(builder).await
    }

    /// Creates an email session and installs its secret on the shared
    /// connection, so every later request carries it.
    pub async fn create_email_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, BackendError> {
        let builder = self
            .conn
            .request(Method::POST, "/v1/account/sessions/email")
            .json(&json!({ "email": email, "password": password }));
        let token: SessionToken = self.conn.recv_json(builder).await?;
        self.conn.set_session(Some(token.secret.clone()));
        Ok(token)
    }

    /// Installs a previously persisted session secret without a round
    /// trip; whether it is still valid shows up on the next request.
    pub fn restore_session(&self, secret: String) {
        self.conn.set_session(Some(secret));
    }

    /// The authenticated account, or `None` when no session is active.
    pub async fn get(&self) -> Result<Option<Account>, BackendError> {
        let builder = self.conn.request(Method::GET, "/v1/account");
        match self.conn.recv_json(builder).await {
            Ok(account) => Ok(Some(account)),
            Err(err) if err.is_unauthorized() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn delete_current_session(&self) -> Result<(), BackendError> {
        let builder = self
            .conn
            .request(Method::DELETE, "/v1/account/sessions/current");
        let result = self.conn.recv_unit(builder).await;
        self.conn.set_session(None);
        result
    }

    /// Default avatar for a new profile. Built client-side, served by the
    /// backend's avatar endpoint when the image is actually displayed.
    pub fn initials_avatar_url(&self, name: &str) -> String {
        let mut url = self.conn.url_for("/v1/avatars/initials");
        url.query_pairs_mut().append_pair("name", name);
        url.to_string()
    }
}
